//! Annotation scripts: one command per line, `#` starts a comment.
//!
//! ```text
//! move right 3          # also left, up, down, next, previous
//! move right max link   # jump as far as possible, moving the link
//! extend right          # contract works the same way
//! search next 2 link    # options come before any query
//! search next foo bar   # find "foo bar"
//! label BUY             # toggle a label by name
//! key b                 # toggle the label bound to a key
//! text a free note
//! remove
//! link                  # link-and-move creates the link and steps on
//! next-file
//! previous-file
//! save
//! quit                  # save-and-quit writes first
//! ```

use anyhow::{anyhow, bail, Result};

use slate_core::{Change, Command, Config, Direction, Mover, SearchDirection};

/// Count and flags that may follow a direction
struct Options {
    distance: usize,
    jump: bool,
    mover: Mover,
}

/// Read leading option words, returning them and the words left over
fn take_options<'a>(words: &'a [&'a str]) -> (Options, &'a [&'a str]) {
    let mut options = Options {
        distance: 1,
        jump: false,
        mover: Mover::Cursor,
    };
    let mut rest = words;
    while let Some((word, tail)) = rest.split_first() {
        match *word {
            "max" => options.jump = true,
            "link" => options.mover = Mover::Link,
            number => match number.parse::<usize>() {
                Ok(n) => options.distance = n,
                Err(_) => break,
            },
        }
        rest = tail;
    }
    (options, rest)
}

fn parse_line(line: &str, config: &Config) -> Result<Option<Command>> {
    let line = line.split('#').next().unwrap_or_default();
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match *verb {
        "move" | "extend" | "contract" => {
            let (direction, rest) = args
                .split_first()
                .ok_or_else(|| anyhow!("{} needs a direction", verb))?;
            let direction: Direction = direction.parse().map_err(|e: String| anyhow!(e))?;
            let (options, rest) = take_options(rest);
            if !rest.is_empty() {
                bail!("unexpected '{}'", rest.join(" "));
            }
            match *verb {
                "move" => Command::Move {
                    direction,
                    distance: options.distance,
                    jump: options.jump,
                    mover: options.mover,
                },
                change => Command::Adjust {
                    direction,
                    change: change.parse::<Change>().map_err(|e: String| anyhow!(e))?,
                    distance: options.distance,
                    jump: options.jump,
                    mover: options.mover,
                },
            }
        }
        "search" => {
            let (direction, rest) = args
                .split_first()
                .ok_or_else(|| anyhow!("search needs a direction"))?;
            let direction: SearchDirection = direction.parse().map_err(|e: String| anyhow!(e))?;
            let (options, rest) = take_options(rest);
            Command::Search {
                query: (!rest.is_empty()).then(|| rest.join(" ")),
                direction,
                count: options.distance,
                jump: options.jump,
                mover: options.mover,
            }
        }
        "label" => match args {
            [name] => Command::Label(name.to_string()),
            _ => bail!("label needs exactly one name"),
        },
        "key" => {
            let key = match args {
                [key] if key.chars().count() == 1 => key.chars().next(),
                _ => None,
            }
            .ok_or_else(|| anyhow!("key needs a single character"))?;
            let label = config
                .label_for_key(key)
                .ok_or_else(|| anyhow!("no label is bound to '{}'", key))?;
            Command::Label(label.name.clone())
        }
        "text" => Command::AssignText(args.join(" ")),
        "remove" => Command::Remove,
        "link" => Command::CreateLink { and_move: false },
        "link-and-move" => Command::CreateLink { and_move: true },
        "next-file" => Command::NextFile,
        "previous-file" => Command::PreviousFile,
        "save" => Command::Save,
        "quit" => Command::Quit { save: false },
        "save-and-quit" => Command::Quit { save: true },
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(command))
}

/// Parse a whole script, naming the line of the first bad command
pub fn parse_script(text: &str, config: &Config) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let command = parse_line(line, config).map_err(|e| anyhow!("script line {}: {}", idx + 1, e))?;
        commands.extend(command);
    }
    Ok(commands)
}
