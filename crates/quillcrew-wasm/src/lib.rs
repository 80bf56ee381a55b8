use wasm_bindgen::prelude::*;

mod app;
mod dom;

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("Quillcrew WASM initialized");
}

/// Initialize the stylizer page
#[wasm_bindgen]
pub fn init_stylizer() -> Result<(), JsValue> {
    log::info!("Initializing stylizer page");
    app::StylizerApp::new()?.start()
}
