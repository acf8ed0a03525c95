use chrono::Utc;
use clap::Subcommand;
use marbles_core::settings::SettingsStore;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one settings field by its JSON name (e.g. SprintTime)
    Get { key: String },
    /// Set one settings field and save
    Set { key: String, value: String },
    /// Print the full settings record as JSON
    Show,
    /// Print the settings file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SettingsStore::open_default()?;
    store.load(Utc::now());

    match action {
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(store.record())?;
            match json.get(&key) {
                Some(serde_json::Value::String(s)) => println!("{s}"),
                Some(other) => println!("{other}"),
                None => return Err(format!("unknown settings key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut json = serde_json::to_value(store.record())?;
            set_field(&mut json, &key, &value)?;
            *store.record_mut() = serde_json::from_value(json)?;
            store.record_mut().sanitize();
            store.save(Utc::now());
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.record())?);
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}

/// Coerce `value` to the field's existing JSON type, so `Set ShowRestBadge
/// false` becomes a bool and `Set SprintTime 30` stays a string.
fn set_field(
    json: &mut serde_json::Value,
    key: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let obj = json
        .as_object_mut()
        .ok_or("settings record is not an object")?;
    let existing = obj
        .get(key)
        .ok_or_else(|| format!("unknown settings key: {key}"))?;

    let new_value = match existing {
        serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
        serde_json::Value::Number(_) => serde_json::Value::Number(value.parse::<i64>()?.into()),
        _ => serde_json::Value::String(value.to_string()),
    };
    obj.insert(key.to_string(), new_value);
    Ok(())
}
