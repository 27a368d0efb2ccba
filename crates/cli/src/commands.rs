use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a query end-to-end and print the result set
    Query {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Query text")]
        sql: String,

        #[arg(long, default_value = "local", help = "Username recorded on the request")]
        username: String,
    },
    /// Parse a query and print its AST as JSON
    Ast {
        #[arg(long, help = "Query text")]
        sql: String,
    },
    /// Manage data-source metadata
    Datasource {
        #[command(subcommand)]
        command: DatasourceCommand,
    },
    /// Manage saved models
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },
    /// Manage published endpoints
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommand,
    },
}

#[derive(Subcommand)]
pub enum DatasourceCommand {
    Add {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Data source name used in queries")]
        name: String,

        #[arg(long = "type", help = "Registry type, e.g. CSV, JSON, PostgreSQL")]
        source_type: String,

        #[arg(long, help = "Registry version; omit for the wildcard entry")]
        version: Option<i64>,

        #[arg(long, help = "Connection properties as a JSON object")]
        properties: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ModelCommand {
    Add {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Model name")]
        name: String,

        #[arg(long, help = "Query text the model runs")]
        sql: String,
    },
}

#[derive(Subcommand)]
pub enum EndpointCommand {
    Add {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Endpoint name")]
        name: String,

        #[arg(long, help = "Model the endpoint resolves to")]
        model: String,
    },
}
