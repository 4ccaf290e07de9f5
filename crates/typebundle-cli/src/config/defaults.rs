use std::path::PathBuf;

pub fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_target() -> String {
    "current".to_string()
}

pub fn default_dts() -> bool {
    true
}
