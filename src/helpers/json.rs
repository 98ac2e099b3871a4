use eyre::{Result, WrapErr};
use std::path::Path;

/// Writes `value` as pretty printed json, replacing any existing file
pub fn write<T>(json_path: &Path, value: &T) -> Result<()>
where
    T: serde::Serialize + ?Sized,
{
    if let Some(dir) = json_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        // Add truncate or shorter content will leave trailing garbage
        .truncate(true)
        .open(json_path)
        .wrap_err_with(|| format!("{:?}", json_path))?;
    serde_json::to_writer_pretty(&mut file, value)?;
    Ok(())
}

pub fn read<T>(json_path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let file = std::fs::File::open(json_path).wrap_err_with(|| format!("{:?}", json_path))?;
    Ok(serde_json::from_reader::<_, T>(std::io::BufReader::new(file))?)
}
