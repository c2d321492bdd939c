use clap::{Parser, Subcommand};
use joyebox::cli::{
    decrypt_file, encrypt_file, show_info, verify_container, DecryptOptions, EncryptOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Version info from build.rs
const VERSION: &str = env!("JOYEBOX_VERSION");
const BUILD: &str = env!("JOYEBOX_BUILD");
const PROFILE: &str = env!("JOYEBOX_PROFILE");
const GIT_HASH: &str = env!("JOYEBOX_GIT_HASH");

/// Combined version string (compile-time concatenation not possible, so we build at runtime)
fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "joyebox")]
#[command(author, about = "Seekable password-encrypted container", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a file into an encrypted container
    #[command(alias = "e")]
    Encrypt {
        /// Password the key is derived from
        #[arg(long, short = 'p', required = true)]
        password: String,

        /// Opaque tag string stored unencrypted in the header
        #[arg(long, default_value = "")]
        tags: String,

        /// Input file to seal
        input: PathBuf,

        /// Output container (defaults to <INPUT>.joye)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Recover the plaintext from a container
    #[command(alias = "d")]
    Decrypt {
        /// Password the container was sealed with
        #[arg(long, short = 'p', required = true)]
        password: String,

        /// Plaintext offset to start from
        #[arg(long, default_value = "0")]
        at: u64,

        /// Verify the authentication tag before emitting anything
        #[arg(long)]
        checked: bool,

        /// Input container
        input: PathBuf,

        /// Output file, or "-" for stdout
        output: PathBuf,
    },

    /// Check a container's authentication tag
    #[command(alias = "v")]
    Verify {
        /// Password the container was sealed with
        #[arg(long, short = 'p', required = true)]
        password: String,

        /// Container to check
        file: PathBuf,
    },

    /// Show information about a container
    #[command(alias = "i")]
    Info {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,

        /// Container to inspect
        file: PathBuf,
    },
}

fn default_output_path(input: &PathBuf) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(".joye");
    PathBuf::from(os)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --version flag
    if cli.version {
        println!("joyebox {}", get_version());
        return ExitCode::SUCCESS;
    }

    // Require a command if not showing version
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // Show help when no command provided
            use clap::CommandFactory;
            Cli::command().print_help().unwrap();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    let result = match command {
        Commands::Encrypt {
            password,
            tags,
            input,
            output,
        } => {
            let options = EncryptOptions {
                password,
                tags: tags.into_bytes(),
            };
            let output_path = output.unwrap_or_else(|| default_output_path(&input));

            match encrypt_file(&input, &output_path, &options) {
                Ok(sealed) => {
                    println!("Sealed {} bytes into {}", sealed, output_path.display());
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        Commands::Decrypt {
            password,
            at,
            checked,
            input,
            output,
        } => {
            let options = DecryptOptions {
                password,
                start: at,
                checked,
            };
            let to_stdout = output.as_os_str() == "-";
            let target = if to_stdout { None } else { Some(output.as_path()) };

            match decrypt_file(&input, target, &options) {
                Ok(recovered) => {
                    if !to_stdout {
                        println!("Recovered {} bytes to {}", recovered, output.display());
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        Commands::Verify { password, file } => match verify_container(&file, &password) {
            Ok(true) => {
                println!("{}: authentic", file.display());
                Ok(())
            }
            Ok(false) => {
                eprintln!("{}: authentication FAILED", file.display());
                return ExitCode::FAILURE;
            }
            Err(e) => Err(e),
        },

        Commands::Info { json, file } => match show_info(&file, json) {
            Ok(info) => {
                print!("{}", info);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
