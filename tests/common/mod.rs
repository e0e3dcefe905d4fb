//! Shared fixtures for integration tests

#![allow(dead_code)]

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const GENDERS: [&str; 2] = ["female", "male"];
const GROUPS: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];
const EDUCATION: [&str; 6] = [
    "associate's degree",
    "bachelor's degree",
    "high school",
    "master's degree",
    "some college",
    "some high school",
];
const LUNCH: [&str; 2] = ["free/reduced", "standard"];
const PREP: [&str; 2] = ["completed", "none"];

/// Synthetic student table whose math score is mostly explained by the
/// reading and writing scores, plus small effects and noise
pub fn student_table(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut gender = Vec::with_capacity(n);
    let mut group = Vec::with_capacity(n);
    let mut education = Vec::with_capacity(n);
    let mut lunch = Vec::with_capacity(n);
    let mut prep = Vec::with_capacity(n);
    let mut reading = Vec::with_capacity(n);
    let mut writing = Vec::with_capacity(n);
    let mut math = Vec::with_capacity(n);

    for _ in 0..n {
        let g = rng.gen_range(0..GENDERS.len());
        let l = rng.gen_range(0..LUNCH.len());
        let p = rng.gen_range(0..PREP.len());
        let r: i64 = rng.gen_range(30..=100);
        let w: i64 = (r + rng.gen_range(-8..=8)).clamp(0, 100);

        let score = 0.55 * r as f64 + 0.35 * w as f64
            + if g == 1 { 5.0 } else { -2.0 }
            + if l == 1 { 4.0 } else { -4.0 }
            + rng.gen_range(-3.0..3.0);

        gender.push(GENDERS[g]);
        group.push(GROUPS[rng.gen_range(0..GROUPS.len())]);
        education.push(EDUCATION[rng.gen_range(0..EDUCATION.len())]);
        lunch.push(LUNCH[l]);
        prep.push(PREP[p]);
        reading.push(r);
        writing.push(w);
        math.push(score.round().clamp(0.0, 100.0) as i64);
    }

    df!(
        "gender" => gender,
        "race_ethnicity" => group,
        "parental_level_of_education" => education,
        "lunch" => lunch,
        "test_preparation_course" => prep,
        "math_score" => math,
        "reading_score" => reading,
        "writing_score" => writing
    )
    .unwrap()
}

/// Files directly inside `dir`, sorted
pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
