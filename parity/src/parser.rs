use chumsky::error::Simple;
use chumsky::primitive::{choice, end, just, none_of};
use chumsky::text::TextParser;
use chumsky::{text, Parser};
use solver::game::Player;

use crate::{Node, ParityGame};

fn number() -> impl Parser<char, usize, Error = Simple<char>> + Clone {
    text::int(10)
        .try_map(|n: String, span| n.parse().map_err(|e| Simple::custom(span, format!("{e}"))))
        .padded()
}

fn player() -> impl Parser<char, Player, Error = Simple<char>> + Clone {
    choice((just('0').to(Player::Even), just('1').to(Player::Odd))).padded()
}

pub fn parse_parity_game(source: &str) -> Result<ParityGame, Vec<Simple<char>>> {
    let semi = just(';').padded();

    let header = text::keyword("parity").padded().ignore_then(number()).then_ignore(semi);
    let start = text::keyword("start").padded().ignore_then(number()).then_ignore(semi).or_not();

    let successors = number().separated_by(just(',').padded()).at_least(1);
    let name = none_of("\"").repeated().collect::<String>().delimited_by(just('"'), just('"'));
    let comment = none_of(";").repeated();
    let row = number()
        .then(number())
        .then(player())
        .then(successors)
        .then(name.padded().or_not())
        .then_ignore(comment)
        .then_ignore(semi)
        .map(|((((id, priority), owner), successors), name)| Node {
            id,
            priority,
            owner,
            successors,
            name,
        });

    let game = header
        .then(start)
        .then(row.repeated())
        .then_ignore(end())
        .map(|((max_id, start), nodes)| ParityGame { max_id, start, nodes });

    game.parse(source)
}

/// Parses a `paritysol` file into the winner of every listed node. Strategy
/// columns are ignored.
pub fn parse_parity_solution(source: &str) -> Result<Vec<(usize, Player)>, Vec<Simple<char>>> {
    let semi = just(';').padded();

    let header = text::keyword("paritysol").padded().ignore_then(number()).then_ignore(semi);
    let strategy = none_of(";").repeated();
    let row = number().then(player()).then_ignore(strategy).then_ignore(semi);

    header.ignore_then(row.repeated()).then_ignore(end()).parse(source)
}
