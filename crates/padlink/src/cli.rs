use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use padlink_guid::SdlVersion;

/// Flags the helper protocol passes with a single dash.
const HELPER_FLAGS: [&str; 2] = ["-sdl2", "-hints"];

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// List connected controllers with their identities.
    Devices {
        /// Also list what every input API reports
        #[arg(short, long)]
        all: bool,
    },
    /// Show the fields of an identity.
    Decode { guid: String },
    /// Rewrite an identity into the layout of an SDL version.
    Convert {
        guid: String,
        /// Controller name used for the checksum
        #[arg(short, long, default_value = "")]
        name: String,
        /// Target SDL version, e.g. 2.30
        #[arg(short = 's', long = "sdl", value_parser = parse_version)]
        version: SdlVersion,
        /// HID manufacturer string
        #[arg(long)]
        manufacturer: Option<String>,
        /// HID product string
        #[arg(long)]
        product: Option<String>,
    },
    /// Print the mapping record for an identity.
    Lookup {
        guid: String,
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// Resolve a captured input code of a controller.
    Resolve {
        guid: String,
        /// button, axis or hat
        kind: String,
        id: u32,
        #[arg(allow_hyphen_values = true)]
        value: i32,
        /// Semantic control, e.g. dpleft or -lefty
        #[arg(short, long, allow_hyphen_values = true)]
        control: Option<String>,
    },
}

/// Controller identity resolution across the Windows input APIs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Helper mode: read controllers from this SDL library and print them
    #[arg(long, value_name = "LIBRARY")]
    pub sdl2: Option<PathBuf>,

    /// SDL hints for helper mode, `NAME=value;...`
    #[arg(long, requires = "sdl2")]
    pub hints: Option<String>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

fn parse_version(input: &str) -> Result<SdlVersion, String> {
    input.parse()
}

/// Rewrites the helper protocol's `-sdl2`/`-hints` into long flags.
pub(crate) fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if HELPER_FLAGS.iter().any(|f| f.eq_ignore_ascii_case(flag)) => {
                OsString::from(format!("-{}", flag.to_ascii_lowercase()))
            }
            _ => arg,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).expect("arguments")
    }

    #[test]
    fn accepts_helper_protocol_flags() {
        let cli = parse(&["padlink", "-sdl2", "C:\\SDL2.dll", "-hints", "SDL_JOYSTICK_HIDAPI=0"]);
        assert_eq!(cli.sdl2, Some(PathBuf::from("C:\\SDL2.dll")));
        assert_eq!(cli.hints.as_deref(), Some("SDL_JOYSTICK_HIDAPI=0"));
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_subcommands() {
        let cli = parse(&["padlink", "-v", "convert", "030000005e0400008e02000000007801", "--sdl", "2.26"]);
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Some(Command::Convert {
                guid: "030000005e0400008e02000000007801".to_owned(),
                name: String::new(),
                version: SdlVersion::Sdl2_26,
                manufacturer: None,
                product: None,
            })
        );

        let cli = parse(&["padlink", "resolve", "030000001008000001e5000000000000", "axis", "0", "-1", "-c", "dpleft"]);
        assert!(matches!(
            cli.command,
            Some(Command::Resolve { value: -1, ref control, .. }) if control.as_deref() == Some("dpleft")
        ));
    }

    #[test]
    fn hints_require_a_library() {
        let args = normalize_args(["padlink", "-hints", "A=1"].map(OsString::from));
        assert!(Cli::try_parse_from(args).is_err());
    }
}
