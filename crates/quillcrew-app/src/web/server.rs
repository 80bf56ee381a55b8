use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use quillcrew_team::StudioClient;

use crate::web::routes::{self, AppState};

/// Web server configuration
pub struct WebServerConfig {
    pub bind_addr: SocketAddr,
    pub engine_url: String,
    pub web_dir: Option<PathBuf>,
}

/// Web server instance
pub struct WebServer {
    config: WebServerConfig,
}

impl WebServer {
    /// Create a new web server
    pub fn new(config: WebServerConfig) -> Self {
        Self { config }
    }

    /// Start the web server
    pub async fn start(self) -> Result<()> {
        let app_state = AppState {
            runner: Arc::new(StudioClient::new(self.config.engine_url.clone())),
        };

        // Create router
        let mut app = routes::create_router(app_state);

        // Add CORS layer for development
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app = app.layer(cors);

        // Serve the compiled browser UI if a directory is provided
        if let Some(web_dir) = &self.config.web_dir {
            if web_dir.exists() {
                println!("Serving static files from: {}", web_dir.display());
                let serve_dir = ServeDir::new(web_dir);
                app = app.nest_service("/static", serve_dir);
            }
        }

        // Start server
        println!("🖋️  Quillcrew server starting on http://{}", self.config.bind_addr);
        println!("   Predict endpoint: http://{}/predict/{{task}}", self.config.bind_addr);
        println!("   Engine URL: {}", self.config.engine_url);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
