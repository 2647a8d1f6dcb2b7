//! Example: fair coin versus double-headed coin.
//!
//! Run with:
//! `cargo run --example coin`

use hmm_viterbi::{Model, Result};

fn main() -> Result<()> {
    // Fair: a normal coin. Loaded: double headed.
    // The coin is picked once and never swapped.
    let coin = Model::new(
        [("Fair", 0.9), ("Loaded", 0.1)],
        ["Fair", "Loaded"],
        [
            ("Fair", vec![("Fair", 1.0), ("Loaded", 0.0)]),
            ("Loaded", vec![("Fair", 0.0), ("Loaded", 1.0)]),
        ],
        [
            ("Fair", vec![('H', 0.5), ('T', 0.5)]),
            ("Loaded", vec![('H', 1.0), ('T', 0.0)]),
        ],
    )?;

    for (label, flips) in [
        ("Very fair coin", "HHTHHTTHTHT"),
        ("Loaded coin", "HHHHHHHHHHH"),
        ("Odd coin", "HHHHHHHHHHHHHHT"),
    ] {
        let best = coin.viterbi(flips.chars())?;
        println!("{label}: p = {:.6e}, path = {:?}", best.probability, best.path);
    }

    println!("Heads in a row:");
    let mut heads = String::from("H");
    for n in 1..=10 {
        let best = coin.viterbi(heads.chars())?;
        println!("{n:2}: p = {:.6}, state = {}", best.probability, best.path[0]);
        heads.push('H');
    }
    Ok(())
}
