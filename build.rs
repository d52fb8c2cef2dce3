use entities::ENTITIES;
use std::io::Write;
use std::{env, path::PathBuf};

fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    // entity::lookup is handed just the inner entity name, like "amp" for
    // "&amp;"; we only match those with a trailing ";".
    //
    // entities::ENTITIES includes many both with and without a trailing ";".
    // Exclude those without, and then write to source only the name, without
    // the leading or trailing "&" or ";".
    //
    // It's also not sorted; upper- and lower-case variants are interleaved.
    // Sort it for binary search.
    let mut names = ENTITIES
        .iter()
        .filter(|e| e.entity.starts_with('&') && e.entity.ends_with(';'))
        .map(|e| (&e.entity[1..e.entity.len() - 1], e.characters))
        .collect::<Vec<_>>();
    names.sort_by_key(|(name, _characters)| *name);

    let min_length = names.iter().map(|(name, _)| name.len()).min().unwrap();
    let max_length = names.iter().map(|(name, _)| name.len()).max().unwrap();

    let out = std::fs::File::create(out_dir.join("entitydata.rs")).unwrap();
    let mut bw = std::io::BufWriter::new(out);
    writeln!(bw, "mod entitydata {{").unwrap();
    writeln!(bw, "    pub const MIN_LENGTH: usize = {};", min_length).unwrap();
    writeln!(bw, "    pub const MAX_LENGTH: usize = {};", max_length).unwrap();
    writeln!(
        bw,
        "    pub static NAMED_ENTITIES: &[(&str, &str); {}] = &[",
        names.len()
    )
    .unwrap();
    for (name, characters) in names {
        writeln!(bw, "        ({:?}, {:?}),", name, characters).unwrap();
    }
    writeln!(bw, "    ];").unwrap();
    writeln!(bw, "}}").unwrap();
}
