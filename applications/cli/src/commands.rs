//! Interactive command parsing
//!
//! One command per stdin line. Words are split on whitespace; the first word
//! picks the command, the rest are its arguments.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Replace the queue with these locations and start the first
    Play(Vec<String>),
    /// Play one location now, keeping the queue
    Open(String),
    Toggle,
    Resume,
    Pause,
    Stop,
    Next,
    Previous,
    Seek(f64),
    /// Slider position in [0, 1]
    Volume(f32),
    Mute,
    Shuffle,
    Repeat,
    Eq {
        bass_db: f32,
        mid_db: f32,
        treble_db: f32,
    },
    Reverb(f32),
    Gain(f32),
    Retry,
    Status,
    Queue,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    Number(String),
}

pub const HELP: &str = "\
Commands:
  play <url|path|playlist.json>...  replace the queue and start playing
  open <url|path>                   play one track now
  toggle | resume | pause | stop
  next | prev
  seek <seconds|m:ss>
  vol <0-100>                       volume in percent
  mute                              toggle mute
  shuffle                           toggle shuffle
  repeat                            cycle repeat (off, one, all)
  eq <bass> <mid> <treble>          band gains in dB
  reverb <0-100>                    reverb mix in percent
  gain <dB>                         master gain
  retry                             reload after an error
  status | queue | help | quit";

/// Parse one line; `Ok(None)` for blank lines
pub fn parse(line: &str) -> Result<Option<Input>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match command.to_ascii_lowercase().as_str() {
        "play" | "p" => {
            if args.is_empty() {
                Input::Toggle
            } else {
                Input::Play(args.iter().map(|s| (*s).to_string()).collect())
            }
        }
        "open" | "o" => match args.as_slice() {
            [location] => Input::Open((*location).to_string()),
            _ => return Err(ParseError::Usage("open <url|path>")),
        },
        "toggle" | "t" => Input::Toggle,
        "resume" => Input::Resume,
        "pause" => Input::Pause,
        "stop" => Input::Stop,
        "next" | "n" => Input::Next,
        "prev" | "previous" => Input::Previous,
        "seek" | "s" => match args.as_slice() {
            [position] => Input::Seek(parse_position(position)?),
            _ => return Err(ParseError::Usage("seek <seconds|m:ss>")),
        },
        "vol" | "volume" | "v" => match args.as_slice() {
            [percent] => Input::Volume(parse_number(percent)? / 100.0),
            _ => return Err(ParseError::Usage("vol <0-100>")),
        },
        "mute" | "m" => Input::Mute,
        "shuffle" => Input::Shuffle,
        "repeat" => Input::Repeat,
        "eq" => match args.as_slice() {
            [bass, mid, treble] => Input::Eq {
                bass_db: parse_number(bass)?,
                mid_db: parse_number(mid)?,
                treble_db: parse_number(treble)?,
            },
            _ => return Err(ParseError::Usage("eq <bass> <mid> <treble>")),
        },
        "reverb" => match args.as_slice() {
            [percent] => Input::Reverb(parse_number(percent)? / 100.0),
            _ => return Err(ParseError::Usage("reverb <0-100>")),
        },
        "gain" => match args.as_slice() {
            [db] => Input::Gain(parse_number(db)?),
            _ => return Err(ParseError::Usage("gain <dB>")),
        },
        "retry" => Input::Retry,
        "status" | "st" => Input::Status,
        "queue" | "q" => Input::Queue,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

fn parse_number(word: &str) -> Result<f32, ParseError> {
    word.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::Number(word.to_string()))
}

/// Seconds, or `m:ss`
fn parse_position(word: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::Number(word.to_string());
    match word.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&seconds) {
                return Err(invalid());
            }
            Ok(f64::from(minutes) * 60.0 + seconds)
        }
        None => word
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse(""), Ok(None));
    }

    #[test]
    fn play_takes_locations() {
        assert_eq!(
            parse("play a.flac https://cdn.example.com/b.mp3"),
            Ok(Some(Input::Play(vec![
                "a.flac".into(),
                "https://cdn.example.com/b.mp3".into()
            ])))
        );
        assert_eq!(parse("play"), Ok(Some(Input::Toggle)));
    }

    #[test]
    fn seek_accepts_clock_format() {
        assert_eq!(parse("seek 90"), Ok(Some(Input::Seek(90.0))));
        assert_eq!(parse("seek 1:30"), Ok(Some(Input::Seek(90.0))));
        assert_eq!(parse("seek 2:05.5"), Ok(Some(Input::Seek(125.5))));
        assert!(parse("seek 1:75").is_err());
        assert!(parse("seek abc").is_err());
    }

    #[test]
    fn percentages_are_scaled() {
        assert_eq!(parse("vol 40"), Ok(Some(Input::Volume(0.4))));
        assert_eq!(parse("reverb 25"), Ok(Some(Input::Reverb(0.25))));
    }

    #[test]
    fn eq_needs_three_bands() {
        assert_eq!(
            parse("eq 3 -2 1.5"),
            Ok(Some(Input::Eq {
                bass_db: 3.0,
                mid_db: -2.0,
                treble_db: 1.5
            }))
        );
        assert_eq!(
            parse("eq 3 -2"),
            Err(ParseError::Usage("eq <bass> <mid> <treble>"))
        );
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse("NEXT"), Ok(Some(Input::Next)));
        assert_eq!(parse("Quit"), Ok(Some(Input::Quit)));
    }

    #[test]
    fn unknown_and_non_finite_input() {
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".into())));
        assert_eq!(parse("gain NaN"), Err(ParseError::Number("NaN".into())));
    }
}
