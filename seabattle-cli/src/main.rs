// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    fmt,
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use clap::{App, Arg, ArgMatches};
use log::debug;
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use regex::Regex;

use seabattle::{
    board::BOARD_SIZE,
    engine::{BoardSide, EngineEvent},
    errors::{CannotPlaceReason, FireError},
    session::{PollConfig, Poller, Session},
    wire::ShotOutcome,
    Board, CellState, Coordinate, EngineConfig, Fleet, FleetPlacement, Orientation, Outcome,
    ShotAttribution,
};

use crate::local::LocalServer;

mod local;

/// Matcher for `place <x>,<y> [dir]`.
static PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?x)(?:place|put)\s+
        (?P<x>[0-9]+)(?:\s*,\s*|\s+)(?P<y>[0-9]+)
        (?:\s+(?P<dir>\w+))?$",
    )
    .unwrap()
});

/// Matcher for `[fire] <x>,<y>`.
static FIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?x)(?:(?:fire|shoot)(?:\s+at)?\s+)?
        (?P<x>[0-9]+)(?:\s*,\s*|\s+)(?P<y>[0-9]+)$",
    )
    .unwrap()
});

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    let matches = App::new("Sea Battle")
        .version("1.0")
        .author("Zachary Stewart <zachary@zstewart.com>")
        .about("Command line battleship client, played against a local bot.")
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .value_name("NAME")
                .help("your player name")
                .takes_value(true)
                .default_value("player"),
        )
        .arg(
            Arg::with_name("opponent")
                .short("o")
                .long("opponent")
                .value_name("NAME")
                .help("name of the bot opponent")
                .takes_value(true)
                .default_value("bot"),
        )
        .arg(
            Arg::with_name("auto_place")
                .short("a")
                .long("auto-place")
                .help("place your fleet at random and skip the placement prompt"),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("seed for random placement and the bot, for a repeatable game")
                .takes_value(true)
                .validator(|v| v.parse::<u64>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("attribution")
                .long("attribution")
                .value_name("KEYING")
                .help("how the server keys shot lists")
                .takes_value(true)
                .possible_values(&["by-shooter", "by-target"])
                .default_value("by-shooter"),
        )
        .arg(
            Arg::with_name("poll_ms")
                .long("poll-ms")
                .value_name("MILLIS")
                .help("milliseconds between state fetches")
                .takes_value(true)
                .default_value("2000")
                .validator(|v| v.parse::<u64>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .get_matches();

    let name = matches.value_of("name").unwrap_or("player").to_owned();
    let opponent = matches.value_of("opponent").unwrap_or("bot").to_owned();
    let attribution: ShotAttribution = matches
        .value_of("attribution")
        .unwrap_or("by-shooter")
        .parse()
        .map_err(|e: String| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let poll = PollConfig {
        interval: Duration::from_millis(parse_arg(&matches, "poll_ms").unwrap_or(2000)),
    };
    let (mut rng, bot_rng) = match parse_arg::<u64>(&matches, "seed") {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };
    debug!("polling every {:?}, shots keyed {:?}", poll.interval, attribution);

    let stdin = std::io::stdin();
    let mut input = InputReader::new(stdin.lock());

    let server = LocalServer::new(opponent, bot_rng, attribution);
    let session = Arc::new(Session::new(
        name,
        server,
        EngineConfig { attribution },
    ));
    let welcome = session.connect().map_err(other_error)?;
    println!("{}", welcome);

    let mut placement = FleetPlacement::new();
    if matches.is_present("auto_place") {
        auto_place(&mut rng, &mut placement);
    } else {
        choose_placements(&mut rng, &mut placement, &mut input)?;
    }
    let fleet = finish_placement(&mut rng, placement)?;
    session.submit_fleet(fleet).map_err(other_error)?;

    session.subscribe(report_enemy_fire);
    let poller = Poller::start(session.clone(), poll);
    play(&session, &mut input)?;
    poller.stop();

    show_boards(&session.own_board(), &session.enemy_board());
    match session.outcome() {
        Some(Outcome::Won) => println!("You win!"),
        Some(Outcome::Lost) => println!("You lose."),
        None => {}
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).and_then(|v| v.parse().ok())
}

fn other_error<E>(err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::Other, err)
}

/// Choose placements for all ships using input from the player.
fn choose_placements(
    rng: &mut impl Rng,
    placement: &mut FleetPlacement,
    input: &mut InputReader<impl BufRead>,
) -> io::Result<()> {
    enum Command {
        Done,
        Place(Coordinate, Option<Orientation>),
        Rotate,
        Clear,
        Auto,
        Help,
    }
    println!();
    println!("Place ships. Type help or ? for commands.");
    loop {
        println!();
        match placement.next_length() {
            Some(len) => println!(
                "Next ship: length {}, {:?}. {} of {} placed.",
                len,
                placement.orientation(),
                placement.placed().len(),
                seabattle::FLEET.len()
            ),
            None => println!("All ships placed, type done to start the game"),
        }
        println!("Your current board setup:");
        show_board(glyphs(&placement.board()));
        println!();

        let cmd = input.read_input_lower(">", |input| match input {
            "?" | "help" | "h" => Some(Command::Help),
            "auto" | "randomize" | "random" => Some(Command::Auto),
            "done" | "start" => Some(Command::Done),
            "clear" => Some(Command::Clear),
            "rotate" | "r" => Some(Command::Rotate),
            other => {
                if let Some(captures) = PLACE.captures(other) {
                    let coord = parse_coordinate(&captures["x"], &captures["y"])?;
                    let dir = match captures.name("dir").map(|m| m.as_str()) {
                        None => None,
                        Some("h") | Some("horizontal") | Some("right") => {
                            Some(Orientation::Horizontal)
                        }
                        Some("v") | Some("vertical") | Some("down") => Some(Orientation::Vertical),
                        Some(other) => {
                            println!("invalid direction {}, choose \"h\" or \"v\"", other);
                            return None;
                        }
                    };
                    Some(Command::Place(coord, dir))
                } else {
                    println!(
                        "Invalid ship-placement command \"{}\". Use '?' for help",
                        other
                    );
                    None
                }
            }
        })?;

        match cmd {
            Command::Done if placement.is_locked() => break,
            Command::Done => println!("You must place all your ships first!"),
            Command::Place(origin, dir) => {
                let orientation = dir.unwrap_or_else(|| placement.orientation());
                if let Err(err) = placement.place(origin, orientation) {
                    match err.reason() {
                        CannotPlaceReason::OutOfBounds => {
                            println!("Invalid placement: not enough space on the board.")
                        }
                        CannotPlaceReason::Occupied => {
                            println!("Invalid placement: overlaps an existing ship.")
                        }
                        CannotPlaceReason::Adjacent => {
                            println!("Invalid placement: ships may not touch, not even diagonally.")
                        }
                        CannotPlaceReason::Locked => println!("All ships are already placed."),
                    }
                }
            }
            Command::Rotate => placement.rotate(),
            Command::Clear => {
                if !placement.clear() {
                    println!("The fleet is complete and can no longer be changed.");
                }
            }
            Command::Auto => auto_place(rng, placement),
            Command::Help => {
                println!(
                    "Available Commands:
    done                  if all ships are placed, start the game.
    place <x>,<y> [dir]   place the next ship with its first cell at the given coordinate.
        Directions are \"h\" (towards increasing x) and \"v\" (towards increasing y).
        Without a direction the current orientation is used.
    rotate                switch the current orientation.
    clear                 remove all placed ships.
    auto                  place the whole fleet at random."
                );
            }
        }
    }
    Ok(())
}

/// Place the whole fleet at random, retrying until it fits.
fn auto_place(rng: &mut impl Rng, placement: &mut FleetPlacement) {
    if placement.is_locked() {
        println!("The fleet is complete and can no longer be changed.");
        return;
    }
    while let Err(err) = placement.auto_place(rng) {
        debug!("{}, retrying", err);
    }
}

/// Turn the placement into a fleet, filling in any ships still missing at random.
fn finish_placement(rng: &mut impl Rng, mut placement: FleetPlacement) -> io::Result<Fleet> {
    if !placement.is_locked() {
        auto_place(rng, &mut placement);
    }
    placement.into_fleet().map_err(|_| {
        io::Error::new(
            io::ErrorKind::Other,
            "the placed ships do not form a valid fleet",
        )
    })
}

/// Print what the opponent's shots did to this player's fleet.
fn report_enemy_fire(event: &EngineEvent) {
    if let EngineEvent::CellUpdated {
        side: BoardSide::Own,
        coord,
        state,
    } = event
    {
        match state {
            CellState::Miss => println!("Enemy fired at {} and missed.", coord),
            CellState::Hit => println!("Enemy hit your ship at {}!", coord),
            _ => {}
        }
    }
}

/// Battle loop: wait for this player's turn, then read and fire shots until the game
/// ends.
fn play<B: BufRead>(
    session: &Session<LocalServer<StdRng>>,
    input: &mut InputReader<B>,
) -> io::Result<()> {
    enum Command {
        Fire(Coordinate),
        Stats,
        Help,
    }
    let mut waiting = false;
    while !session.is_game_over() {
        if !session.is_my_turn() {
            if !waiting {
                println!("Waiting for the opponent...");
                waiting = true;
            }
            thread::sleep(Duration::from_millis(50));
            continue;
        }
        waiting = false;
        println!();
        show_boards(&session.own_board(), &session.enemy_board());

        let cmd = input.read_input_lower("fire x,y >", |input| match input {
            "?" | "help" | "h" => Some(Command::Help),
            "stats" | "s" => Some(Command::Stats),
            other => match FIRE.captures(other) {
                Some(captures) => {
                    parse_coordinate(&captures["x"], &captures["y"]).map(Command::Fire)
                }
                None => {
                    println!("Invalid command \"{}\". Use '?' for help", other);
                    None
                }
            },
        })?;

        match cmd {
            Command::Fire(coord) => match session.fire(coord) {
                Ok(ShotOutcome::Hit) => println!("Hit! Fire again."),
                Ok(ShotOutcome::Miss) => println!("Miss."),
                Ok(ShotOutcome::Win) => println!("That was their last ship."),
                Err(FireError::NotAllowed(_)) => {
                    println!("You cannot fire at {} right now.", coord)
                }
                Err(FireError::Rejected { message, .. }) => println!("Refused: {}", message),
                Err(err) => println!("{}", err),
            },
            Command::Stats => {
                let stats = session.statistics();
                println!(
                    "Shots: {} | Accuracy: {}% | Your ships: {} | Enemy ships: {}",
                    stats.total_shots,
                    stats.accuracy_percent,
                    stats.remaining_ships,
                    stats.enemy_remaining_ships
                );
            }
            Command::Help => println!(
                "Available Commands:
    [fire] <x>,<y>   fire at the given cell of the enemy board.
    stats            show shot statistics."
            ),
        }
    }
    Ok(())
}

fn parse_coordinate(x: &str, y: &str) -> Option<Coordinate> {
    let x = match x.parse() {
        Ok(x) if x < BOARD_SIZE => x,
        _ => {
            println!("x must be in range [0,9], got {}", x);
            return None;
        }
    };
    let y = match y.parse() {
        Ok(y) if y < BOARD_SIZE => y,
        _ => {
            println!("y must be in range [0,9], got {}", y);
            return None;
        }
    };
    Some(Coordinate::new(x, y))
}

/// Print this player's board next to what is known of the enemy's.
fn show_boards(own: &Board, enemy: &Board) {
    println!("Your board:");
    show_board(glyphs(own));
    println!("Enemy board:");
    show_board(glyphs(enemy));
}

fn glyphs(board: &Board) -> impl '_ + Iterator<Item = impl '_ + Iterator<Item = Glyph>> {
    board.rows().map(|row| row.map(Glyph))
}

/// Show the board by printing the grid. Takes an iterator over the rows of iterators over
/// the items
fn show_board(rows: impl Iterator<Item = impl Iterator<Item = impl fmt::Display>>) {
    print!("   ");
    for i in 0..BOARD_SIZE {
        print!("{:^4}", i);
    }
    println!();
    for (i, row) in rows.enumerate() {
        print!("{:>2} ", i);
        for cell in row {
            print!("{:^4}", cell);
        }
        println!();
    }
}

/// Display helper for one cell.
struct Glyph(CellState);

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match self.0 {
            CellState::Empty => "~~",
            CellState::Ship => "##",
            CellState::Hit => "x#",
            CellState::Miss => "x",
            CellState::Sunk => "X#",
        })
    }
}

/// Helper to read input from the player.
struct InputReader<B> {
    read: B,
    buf: String,
}

impl<B> InputReader<B> {
    fn new(read: B) -> Self {
        Self {
            read,
            buf: String::new(),
        }
    }
}

impl<B: BufRead> InputReader<B> {
    /// Repeatedly tries to read input until the input checker returns `Some`. Converts
    /// to ascii lower before running the checker.
    fn read_input_lower<F, T>(&mut self, prompt: &str, mut checker: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        loop {
            self.read_input_inner(prompt)?;
            self.buf.make_ascii_lowercase();
            if let Some(val) = checker(self.buf.trim()) {
                return Ok(val);
            }
        }
    }

    /// Helper to print the prompt, clear the string buffer and read a line.
    fn read_input_inner(&mut self, prompt: &str) -> io::Result<()> {
        print!("{} ", prompt);
        io::stdout().flush()?;
        self.buf.clear();
        if self.read.read_line(&mut self.buf)? == 0 {
            println!();
            std::process::exit(0);
        }
        Ok(())
    }
}
