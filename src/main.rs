use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    add: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    if let Some(folder) = args.add {
        let mut settings = shufflebox::config::load_settings()?;
        let path = PathBuf::from(folder);
        if !settings.folders.contains(&path) {
            settings.folders.push(path);
        }
        shufflebox::config::save_settings(&settings)?;
    }

    shufflebox::app::run()
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--add" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--add requires a folder path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--add cannot be empty");
                }
                out.add = Some(value.trim().to_string());
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("ShuffleBox");
    println!("  --add <folder>    Add a music folder to the catalog settings");
}
