use clap::Parser;

use networth::api::{
    Cli, Command, InputError, build_assumptions, build_solve_config, render_projection_table,
    render_solve_result, run_http_server,
};
use networth::core::{generate_projection, goal_status, solve_savings_rate};

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                log::error!("server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Project(args) => {
            let assumptions = build_assumptions(&args).unwrap_or_else(|e| exit_with(e));
            let projection = generate_projection(&assumptions);
            let goal = goal_status(&projection, assumptions.goal_net_worth);
            print!("{}", render_projection_table(&projection, goal));
        }
        Command::Solve { projection, solve } => {
            let outcome = build_assumptions(&projection).and_then(|assumptions| {
                let config = build_solve_config(solve)?;
                Ok(solve_savings_rate(&assumptions, config)?)
            });
            match outcome {
                Ok(result) => print!("{}", render_solve_result(&result)),
                Err(e) => exit_with(e),
            }
        }
    }
}

// env_logger's default filter keeps `error` records, so these reach stderr
// without RUST_LOG being set.
fn exit_with(err: InputError) -> ! {
    log::error!("{err}");
    std::process::exit(2);
}
