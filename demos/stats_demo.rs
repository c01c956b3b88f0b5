use clap::Parser;
use oa_hash::Bucket;
use oa_hash::HashTable;
use oa_hash::InsertErrorKind;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial_capacity", default_value_t = 64)]
    initial_capacity: usize,

    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: usize,

    /// Remove every n-th key after inserting it, leaving tombstones behind.
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: usize,
}

fn main() {
    let args = Args::parse();

    let keys: Vec<Vec<u8>> = (0..args.entries)
        .map(|i| format!("key_{i:08}").into_bytes())
        .collect();

    // Each generation doubles the previous one; the table only ever borrows them.
    let mut generations: Vec<Vec<Bucket<&[u8], usize>>> = Vec::new();
    let mut capacity = args.initial_capacity.max(1);
    while capacity / 2 <= args.entries {
        generations.push((0..capacity).map(|_| Bucket::EMPTY).collect());
        capacity *= 2;
    }

    println!(
        "Creating HashTable with initial capacity: {}",
        args.initial_capacity.max(1)
    );

    let mut generations = generations.iter_mut();
    let Some(first) = generations.next() else {
        return;
    };
    let mut table = HashTable::new(first);
    let mut rehashes = 0;

    for (i, key) in keys.iter().enumerate() {
        if let Err(err) = table.try_set(key.as_slice(), i) {
            let InsertErrorKind::NoSpace { capacity } = err.kind() else {
                panic!("unexpected insert failure: {err}");
            };
            let Some(next) = generations.next() else {
                println!("Out of storage at {capacity} buckets");
                break;
            };
            table.rehash(next).expect("new generation is larger");
            rehashes += 1;
            let (key, value) = err.into_parts();
            table.set(key, value).expect("rehashed table has room");
        }

        if args.remove_every > 0 && i % args.remove_every == 0 {
            table.remove(key);
        }
    }

    println!(
        "Inserted {} live entries with {} rehashes, final capacity {}",
        table.len(),
        rehashes,
        table.capacity()
    );

    table.probe_histogram().print();
    table.debug_stats().print();
}
