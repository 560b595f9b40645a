use crate::config::{data_dir, CounterConfig, KNOWN_KEYS};

/// Run the config command
pub fn run_config(key: Option<&str>, value: Option<&str>) -> Result<(), String> {
    let path = data_dir();
    if !path.exists() {
        return Err(format!(
            "No data directory at {}. Run 'prompt-counter init' first.",
            path.display()
        ));
    }
    let mut config = CounterConfig::new(path);

    match (key, value) {
        (None, None) => {
            println!("Current configuration:\n");
            for ((k, v), (_, _, help)) in config.effective().iter().zip(KNOWN_KEYS) {
                println!("  {:20} {:>8}  {}", k, v, help);
            }
        }
        (Some(k), None) => {
            let value = config
                .effective()
                .into_iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v)
                .ok_or_else(|| format!("Unknown config key: {}", k))?;
            println!("{}: {}", k, value);
        }
        (Some(k), Some(v)) => {
            config.set(k, v)?;
            println!("Set {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}
