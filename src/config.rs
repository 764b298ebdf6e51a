use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "agency-gateway")]
#[command(about = "API backend for the agency website")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Hosted database (PostgREST) base URL
    // Example: "https://project.supabase.co"
    // Without it the server keeps everything in memory
    #[arg(long, env = "SUPABASE_URL")]
    pub database_url: Option<String>,

    // Service key sent as apikey + bearer token
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub database_key: Option<String>,

    // Timeout for a single database call, in seconds
    #[arg(long, default_value_t = 10)]
    pub db_timeout: u64,

    // Bearer token for /api/admin routes
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,
}
