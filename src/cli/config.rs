use crate::error::Result;
use crate::settings::{config_dir, load_settings, save_settings, validate_api_url, API_URL_ENV};

pub fn show(api_url_flag: Option<&str>) -> Result<()> {
    let settings = load_settings();
    println!("Config dir:      {}", config_dir().display());
    println!("Saved API URL:   {}", settings.api_base_url);
    println!("Effective URL:   {}", settings.resolve_api_url(api_url_flag));
    if let Ok(env) = std::env::var(API_URL_ENV) {
        println!("  ({API_URL_ENV}={env})");
    }
    match settings.request_timeout_secs {
        Some(secs) => println!("Request timeout: {secs}s"),
        None => println!("Request timeout: none"),
    }
    Ok(())
}

pub fn set_url(url: &str) -> Result<()> {
    let url = validate_api_url(url)?;
    let mut settings = load_settings();
    settings.api_base_url = url.clone();
    save_settings(&settings)?;
    println!("API URL set to {url}");
    Ok(())
}

pub fn set_timeout(seconds: u64) -> Result<()> {
    let mut settings = load_settings();
    settings.request_timeout_secs = (seconds > 0).then_some(seconds);
    save_settings(&settings)?;
    match settings.request_timeout_secs {
        Some(secs) => println!("Request timeout set to {secs}s"),
        None => println!("Request timeout disabled"),
    }
    Ok(())
}
