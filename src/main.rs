use clap::Parser;
use image_cli::cli::{self, Cli};
use image_cli::error::write_error;

fn main() {
    // Usage errors exit through clap with its own status
    let args = Cli::parse();

    let mut stdout = std::io::stdout();
    let code = match cli::run(args, &mut stdout) {
        Ok(()) => 0,
        Err(e) => {
            let _ = write_error(&mut std::io::stderr(), &e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
