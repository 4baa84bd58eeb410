use crate::config::cli::LocalStorage;
use crate::config::toml_config::FactoryConfig;
use crate::config::{CliConfig, Command, ExportFormat};
use crate::core::global::Defaults;
use crate::core::properties::parse_assignment;
use crate::domain::model::DeviceRef;
use crate::domain::ports::SnapshotStorage;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::fmt::Write as _;
use std::io::Write;

/// 執行一個 CLI 子命令，結果寫到 `out`。
///
/// `--state` 的快照在命令前載入；只有 `set` 與 `reset` 會寫回。
pub fn run(
    config: &CliConfig,
    defaults: &Defaults,
    factory: &FactoryConfig,
    out: &mut impl Write,
) -> Result<()> {
    let storage = config.state.as_ref().map(LocalStorage::new);
    if let Some(storage) = &storage {
        if let Some(snapshot) = storage.load()? {
            let changed = defaults.load_json(&snapshot)?;
            tracing::debug!(
                "Restored {} properties from {}",
                changed.len(),
                storage.path().display()
            );
        }
    }

    match &config.command {
        Command::Show => write!(out, "{}", defaults.view()?)?,
        Command::Get { name } => {
            writeln!(out, "{}", serde_json::to_string_pretty(&defaults.get(name)?)?)?
        }
        Command::Set { assignments } => {
            let values = assignments
                .iter()
                .map(|assignment| parse_assignment(assignment))
                .collect::<Result<Vec<_>>>()?;
            let changed = defaults.set_values(values)?;
            tracing::info!("Changed {} properties", changed.len());
            write!(out, "{}", defaults.view()?)?;
        }
        Command::Reset => {
            defaults.reset()?;
            write!(out, "{}", defaults.view()?)?;
        }
        Command::Export { format, output } => {
            let text = export(defaults, *format)?;
            match output {
                Some(path) => {
                    LocalStorage::new(path).save(&text)?;
                    writeln!(out, "📁 Properties exported to: {}", path.display())?;
                }
                None => write!(out, "{}", text)?,
            }
        }
        Command::Devices => write!(out, "{}", render_devices(defaults)?)?,
        Command::Check => {
            factory.validate()?;
            writeln!(out, "✅ Configuration is valid. Factory defaults:")?;
            write!(out, "{}", defaults.with(|store| store.factory().view())??)?;
        }
    }

    if let Some(storage) = &storage {
        if config.persists_state() {
            storage.save(&defaults.to_json()?)?;
            tracing::info!("📁 State saved to: {}", storage.path().display());
        }
    }
    Ok(())
}

/// JSON 帶 `exportedAt` 欄位，TOML 則在第一行加註解
pub fn export(defaults: &Defaults, format: ExportFormat) -> Result<String> {
    let exported_at = chrono::Utc::now().to_rfc3339();
    match format {
        ExportFormat::Json => {
            let mut snapshot = serde_json::to_value(defaults.snapshot()?)?;
            if let Some(object) = snapshot.as_object_mut() {
                object.insert(
                    "exportedAt".to_string(),
                    serde_json::Value::String(exported_at),
                );
            }
            Ok(format!("{}\n", serde_json::to_string_pretty(&snapshot)?))
        }
        ExportFormat::Toml => {
            let body = defaults.with(|store| store.to_toml())??;
            Ok(format!("# exported at {}\n{}", exported_at, body))
        }
    }
}

/// One line per device. `*` marks the device used for both directions,
/// `>` input only, `<` output only.
pub fn render_devices(defaults: &Defaults) -> Result<String> {
    let selected = defaults.snapshot()?.device().clone();
    let mut text = String::new();
    for device in defaults.list_devices()? {
        let id = DeviceRef::Index(device.index);
        let mark = match (selected.input == id, selected.output == id) {
            (true, true) => "*",
            (true, false) => ">",
            (false, true) => "<",
            (false, false) => " ",
        };
        let _ = writeln!(
            text,
            "{} {} {} ({} in, {} out) {} Hz",
            mark,
            device.index,
            device.name,
            device.max_input_channels,
            device.max_output_channels,
            device.default_sample_rate
        );
    }
    Ok(text)
}
