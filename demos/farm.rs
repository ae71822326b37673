use serde::Deserialize;
use settings_overlay::config::Bundle;
use settings_overlay::{settings, SettingsBuilder};
use tracing_subscriber::EnvFilter;

settings! {
    #[derive(Debug, Default, Clone, Deserialize)]
    pub struct Irrigation {
        pub schedule: String,
        pub zones: u32,
    }
}

settings! {
    #[derive(Debug, Default, Clone, Deserialize)]
    pub struct Farm {
        pub name: String,
        pub location: String,
        pub irrigation: Irrigation,
    }
}

static ASSETS: Bundle = Bundle::new(
    "farm",
    &[("baseline.toml", include_str!("farm/baseline.toml"))],
);

fn main() -> Result<(), settings_overlay::ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let defaults = Farm {
        name: Some("default-farm".into()),
        location: Some("unset".into()),
        irrigation: None,
    };

    // Try FARM__LOCATION=us-east or FARM__IRRIGATION__ZONES=8
    let farm = SettingsBuilder::from_base(defaults)
        .with_embedded(Some(ASSETS), "baseline.toml")
        .with_file("demos/farm/farm.json", false)
        .with_env("FARM", "__")
        .build_snapshot()?;

    println!(
        "Farm: {} ({})",
        farm.name.as_deref().unwrap_or("?"),
        farm.location.as_deref().unwrap_or("?")
    );
    if let Some(irrigation) = &farm.irrigation {
        println!(
            "Irrigation: {} zones at {}",
            irrigation.zones.unwrap_or_default(),
            irrigation.schedule.as_deref().unwrap_or("?")
        );
    }

    Ok(())
}
