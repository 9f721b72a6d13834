use crate::{HaResourceApi, ProxmoxClient, ProxmoxResult};
use dotenvy::dotenv;
use std::env;

fn setup() {
    dotenv().ok();
}

fn client_from_env() -> ProxmoxResult<ProxmoxClient> {
    let host = env::var("PROXMOX_HOST").expect("PROXMOX_HOST not set");
    let port: u16 = env::var("PROXMOX_PORT")
        .expect("PROXMOX_PORT not set")
        .parse()
        .expect("invalid port");
    let username = env::var("PROXMOX_USERNAME").expect("PROXMOX_USERNAME not set");
    let password = env::var("PROXMOX_PASSWORD").expect("PROXMOX_PASSWORD not set");
    let realm = env::var("PROXMOX_REALM").expect("PROXMOX_REALM not set");

    ProxmoxClient::builder()
        .host(host)
        .port(port)
        .credentials(username, password, realm)
        .secure(true)
        .accept_invalid_certs(true) // allow self-signed certs for testing
        .build()
}

#[tokio::test]
#[ignore = "requires running Proxmox instance and environment variables"]
async fn test_integration_login_success() -> ProxmoxResult<()> {
    setup();
    let client = client_from_env()?;

    client.login().await?;
    assert!(client.is_authenticated().await);

    Ok(())
}

#[tokio::test]
#[ignore = "requires running Proxmox instance and environment variables"]
async fn test_integration_fetch_ha_resources() -> ProxmoxResult<()> {
    setup();
    let client = client_from_env()?;
    client.login().await?;

    // Works whether or not the cluster has HA configured; the payload shape
    // is all we can assert against an arbitrary instance.
    let raw = client.api().fetch_ha_resources().await?;
    assert!(raw.get("data").is_some() || raw.is_array());

    Ok(())
}
