use clap::Parser;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    #[arg(long, short, env = "SSE_RELAY_SOURCE")]
    /// Source SSE channel URL e.g: https://hook.pipelinesascode.com/aBcD12
    /// (a fresh channel is provisioned when omitted)
    pub source: Option<String>,

    #[arg(long, short, env = "SSE_RELAY_TARGET")]
    /// Target URL to local webserver e.g: http://localhost:3000/api/webhook
    pub target: String,
}

pub fn args() -> Args {
    Args::parse()
}
