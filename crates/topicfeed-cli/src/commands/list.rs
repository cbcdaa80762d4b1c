use anyhow::Result;

use topicfeed_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    let sources = config.sources()?;

    if sources.is_empty() {
        println!("No feeds configured.");
        println!("\nAdd feeds to {}:", AppConfig::config_path().display());
        println!("  [[feeds]]");
        println!("  url = \"https://example.com/feed/\"");
        println!("  label = \"Example\"");
        return Ok(());
    }

    println!("Feeds ({}):\n", sources.len());

    for source in &sources {
        println!("  {}", source.label);
        println!("    URL: {}", source.url);
    }

    Ok(())
}
