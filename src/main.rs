#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    notebooklm_mcp_server::run()
        .await
        .inspect_err(|err| log::error!("notebooklm-mcp stopped: {err:#}"))
}
