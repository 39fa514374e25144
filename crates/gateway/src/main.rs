//! `coachdesk` command-line entry point.

use anyhow::{Context, bail};
use chrono::Utc;

use coachdesk_auth::{FileSessionStore, SessionState, explain_scope, resolve_actor_context};
use coachdesk_core::ResourceType;
use coachdesk_gateway::{GatewayConfig, RestGateway, ScopedReader};

const USAGE: &str = "usage: coachdesk <login EMAIL PASSWORD | logout | whoami | list RESOURCE>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    coachdesk_observability::init();

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    let session = SessionState::new(FileSessionStore::new(&config.session_file));
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", email, password] => {
            let gateway = RestGateway::new(&config)?;
            let login = gateway.login(email, password).await.context("login failed")?;
            session
                .persist_login(&login, Utc::now())
                .context("could not persist session")?;
            println!("{}", serde_json::to_string_pretty(&resolve_actor_context(&session))?);
        }
        ["logout"] => {
            session.logout().context("could not clear session")?;
        }
        ["whoami"] => {
            let actor = resolve_actor_context(&session);
            let scopes: Vec<_> = ResourceType::ALL
                .into_iter()
                .map(|r| explain_scope(&actor, r, &config.policy))
                .collect();
            let out = serde_json::json!({
                "actor": actor,
                "loggedInAt": session.logged_in_at(),
                "scopes": scopes,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ["list", resource] => {
            let resource: ResourceType = resource.parse()?;
            let Some(token) = session.token() else {
                bail!("not logged in; run `coachdesk login` first");
            };
            let actor = resolve_actor_context(&session);
            let reader = ScopedReader::new(RestGateway::new(&config)?.with_token(token))
                .with_policy(config.policy.clone());
            let rows = reader
                .visible_json(&actor, resource)
                .await
                .with_context(|| format!("listing {resource} failed"))?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
