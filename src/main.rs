// src/main.rs

use deployrun::{cli, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("deployrun error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code.as_i32());
}
