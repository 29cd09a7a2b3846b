use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::error;

pub struct Args {
    pub config: Option<PathBuf>,
    pub write_config: Option<PathBuf>,
    /// Frames spent in each timed phase of the session
    pub frames: u32,
    pub debug: bool,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args {
            config: None,
            write_config: None,
            frames: 60,
            debug: false,
        };

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--debug" {
                res.debug = true;
            } else if arg == "-c" || arg == "--config" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("config argument missing?");
                    continue;
                };
                res.config = Some(PathBuf::from(path));
            } else if arg == "--write-config" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("write-config argument missing?");
                    continue;
                };
                res.write_config = Some(PathBuf::from(path));
            } else if arg == "--frames" {
                i += 1;
                let Some(frames) = args.get(i) else {
                    error!("frames argument missing?");
                    continue;
                };
                match frames.parse() {
                    Ok(frames) => res.frames = frames,
                    Err(err) => error!("failed to parse frames '{frames}': {err}"),
                }
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Args, BTreeSet<String>) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Args::parse(&args)
    }

    #[test]
    fn parses_known_flags() {
        let (args, unknown) = parse(&["--debug", "--config", "deck.json", "--frames", "12"]);
        assert!(args.debug);
        assert_eq!(args.config, Some(PathBuf::from("deck.json")));
        assert_eq!(args.frames, 12);
        assert!(unknown.is_empty());
    }

    #[test]
    fn keeps_unknown_and_bad_values() {
        let (args, unknown) = parse(&["--frames", "lots", "--vr"]);
        assert_eq!(args.frames, 60);
        assert!(unknown.contains("--vr"));
        assert_eq!(unknown.len(), 1);
    }
}
