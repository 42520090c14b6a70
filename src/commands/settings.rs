use crate::settings::{self, AppSettings};

pub fn get_settings() -> Result<AppSettings, String> {
    settings::load_settings(&settings::settings_path()?)
}

pub fn set_setting(key: &str, value: &str) -> Result<(), String> {
    settings::update_setting(&settings::settings_path()?, key, value)
}
