use tokio::io::{AsyncBufReadExt, BufReader};

use modpanel_dashboard::commands::{self, Outcome};
use modpanel_dashboard::config::DashboardConfig;
use modpanel_dashboard::notify::ConsoleNotifier;
use modpanel_dashboard::Dashboard;
use modpanel_shared::clients::HttpApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modpanel_shared::middleware::init_tracing("modpanel-dashboard");

    let config = DashboardConfig::load()?;
    let policy = config.derivation_policy()?;
    let api = HttpApiClient::new(&config.api_base_url, &config.api_token, config.request_timeout())?;

    tracing::info!(api = %api.base_url(), ?policy, "modpanel starting");

    let dashboard = Dashboard::new(api, ConsoleNotifier, policy, &config.default_reason);
    dashboard.refresh().await;
    println!("{}", dashboard.render());
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("✖ {e}");
                continue;
            }
        };

        match commands::execute(&dashboard, command).await {
            Outcome::Print(text) => println!("{text}"),
            Outcome::Quiet => {}
            Outcome::Quit => break,
        }
    }

    tracing::info!("modpanel stopped");
    Ok(())
}
