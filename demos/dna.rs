//! Example: high/low GC-content regions in a DNA fragment.
//!
//! Run with:
//! `cargo run --example dna`

use hmm_viterbi::{Model, Result};

fn main() -> Result<()> {
    let gc = Model::new(
        [('H', 0.5), ('L', 0.5)],
        ['H', 'L'],
        [
            ('H', vec![('H', 0.5), ('L', 0.5)]),
            ('L', vec![('H', 0.4), ('L', 0.6)]),
        ],
        [
            ('H', vec![('A', 0.2), ('C', 0.3), ('G', 0.3), ('T', 0.2)]),
            ('L', vec![('A', 0.3), ('C', 0.2), ('G', 0.2), ('T', 0.3)]),
        ],
    )?;

    print!("{gc}");

    let best = gc.viterbi("GGCACTGAA".chars())?;
    let path: String = best.path.iter().collect();
    println!("Best path log2-probability: {}", best.log2_probability);
    println!("Best path probability: {:e}", best.probability);
    println!("State sequence: {path}");
    Ok(())
}
