use std::fs;
use std::io;
use std::path::Path;

use uuid::Uuid;

pub fn generate() -> String {
    format!("backoffice-{}", Uuid::new_v4().simple())
}

pub fn load_or_create(path: &Path) -> io::Result<String> {
    match fs::read_to_string(path) {
        Ok(saved) if !saved.trim().is_empty() => return Ok(saved.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let key = generate();
    fs::write(path, &key)?;
    Ok(key)
}
