// build.rs

use clap::builder::FalseyValueParser;
use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn package_arg(help: &'static str) -> Arg {
    Arg::new("package").required(true).help(help)
}

fn build_cli() -> Command {
    Command::new("zcr")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Zenit Linux Contributors")
        .about("Zenit Community Repository package manager")
        .subcommand_required(false)
        .arg(
            Arg::new("manifest_url")
                .long("manifest-url")
                .global(true)
                .env("ZCR_MANIFEST_URL")
                .help("URL of the package manifest"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .env("ZCR_ROOT")
                .default_value("/usr/lib/zcr")
                .help("Directory holding installed packages"),
        )
        .arg(
            Arg::new("cache_file")
                .long("cache-file")
                .global(true)
                .env("ZCR_CACHE_FILE")
                .default_value("/tmp/repo-list.zcr")
                .help("Where the last fetched manifest is saved"),
        )
        .arg(
            Arg::new("log_file")
                .long("log-file")
                .global(true)
                .env("ZCR_LOG_FILE")
                .default_value("/tmp/zcr.log")
                .help("Log file"),
        )
        .arg(
            Arg::new("no_color")
                .long("no-color")
                .global(true)
                .env("NO_COLOR")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new())
                .help("Disable colored output"),
        )
        .subcommand(
            Command::new("install")
                .about("Install a package")
                .arg(package_arg("Package name as listed in the manifest")),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a package")
                .arg(package_arg("Installed package name")),
        )
        .subcommand(
            Command::new("update")
                .about("Update a specific package")
                .arg(package_arg("Installed package name")),
        )
        .subcommand(
            Command::new("update-all")
                .alias("upgrade")
                .about("Update all installed packages"),
        )
        .subcommand(
            Command::new("find")
                .about("Search for packages in the manifest")
                .arg(
                    Arg::new("query")
                        .required(true)
                        .help("Case-insensitive substring of the package name"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print matches as JSON"),
                ),
        )
        .subcommand(Command::new("list").about("List installed packages"))
        .subcommand(Command::new("refresh").about("Download the repository list"))
        .subcommand(Command::new("autoremove").about("Remove temporary files and logs"))
        .subcommand(Command::new("how-to-add").about("Instructions for adding new repositories"))
        .subcommand(Command::new("ui").about("Start the interactive interface"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    let man_path = man_dir.join("zcr.1");
    fs::write(&man_path, buffer)?;

    println!("cargo:warning=Man page generated at {}", man_path.display());
    Ok(())
}
