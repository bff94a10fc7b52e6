use super::config::BondConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::atom::Atom;
use crate::core::models::bond::Bond;
use crate::core::models::structure::PrimaryStructure;
use crate::core::spatial::KdTree;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument};

/// Bonds found so far, guarded by a single lock shared by all workers.
#[derive(Default)]
struct BondAccumulator {
    bonds: Vec<Bond>,
    keys: HashSet<Bond>,
}

/// Number of chunks the atom list is split into; one worker is reserved for coordination.
fn chunk_count(workers: usize) -> usize {
    workers.saturating_sub(1).max(1)
}

/// Infers covalent bonds from interatomic distances.
///
/// Every atom is queried against a k-d tree of all positions with the global maximum bond
/// length as radius. Candidates whose element pair resolves to a stricter length are checked
/// again against that length. The atom list is split into `max(1, workers - 1)` contiguous
/// chunks processed concurrently.
///
/// The returned map assigns ids after sorting the canonical pairs, so it depends only on the
/// atoms and `config`: neither the input order nor the worker count changes it.
#[instrument(skip_all, name = "bond_inference", fields(atoms = atoms.len(), workers = workers))]
pub fn infer_bonds(
    atoms: &[Atom],
    config: &BondConfig,
    workers: usize,
    reporter: &ProgressReporter,
) -> Result<BTreeMap<usize, Bond>, EngineError> {
    config.validate()?;
    if atoms.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut ordered: Vec<&Atom> = atoms.iter().collect();
    ordered.sort_by_key(|atom| atom.index);
    let tree: KdTree<f32, usize, 3> = ordered
        .iter()
        .enumerate()
        .map(|(slot, atom)| (position_of(atom), slot))
        .collect();

    let chunks = chunk_count(workers);
    let chunk_size = ordered.len().div_ceil(chunks);
    debug!(chunks, chunk_size, "Partitioned atoms for bond search.");

    let shared = Mutex::new(BondAccumulator::default());
    let process_chunk = |chunk: &[&Atom]| {
        let found = search_chunk(chunk, &ordered, &tree, config);
        {
            let mut acc = shared.lock();
            for bond in found {
                if acc.keys.insert(bond) {
                    acc.bonds.push(bond);
                }
            }
        }
        reporter.report(Progress::TaskAdvance { units: 1 });
    };

    reporter.report(Progress::TaskStart {
        total: ordered.chunks(chunk_size).len() as u64,
    });

    #[cfg(feature = "parallel")]
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(chunks)
            .thread_name(|i| format!("bond-worker-{i}"))
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
        let process_chunk = &process_chunk;
        pool.scope(|scope| {
            for chunk in ordered.chunks(chunk_size) {
                scope.spawn(move |_| process_chunk(chunk));
            }
        });
    }

    #[cfg(not(feature = "parallel"))]
    for chunk in ordered.chunks(chunk_size) {
        process_chunk(chunk);
    }

    reporter.report(Progress::TaskFinish);

    let mut bonds = shared.into_inner().bonds;
    bonds.sort_unstable();
    info!(bonds = bonds.len(), "Bond inference complete.");
    Ok(bonds.into_iter().enumerate().collect())
}

/// Runs [`infer_bonds`] over every atom of a structure.
pub fn infer_structure_bonds(
    structure: &PrimaryStructure,
    config: &BondConfig,
    workers: usize,
    reporter: &ProgressReporter,
) -> Result<BTreeMap<usize, Bond>, EngineError> {
    infer_bonds(structure.atoms(), config, workers, reporter)
}

fn position_of(atom: &Atom) -> [f32; 3] {
    [atom.position.x, atom.position.y, atom.position.z]
}

fn search_chunk(
    chunk: &[&Atom],
    ordered: &[&Atom],
    tree: &KdTree<f32, usize, 3>,
    config: &BondConfig,
) -> Vec<Bond> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    // The query point itself is always returned, so it gets one extra slot.
    let cap = config.max_bonds_per_atom + 1;

    for atom in chunk {
        for neighbour in tree.nearest_within(&position_of(atom), config.max_bond_length, cap) {
            let other = ordered[*neighbour.value];
            if other.index == atom.index {
                continue;
            }
            let bond = Bond::new(atom.index, other.index);
            if !seen.insert(bond) {
                continue;
            }
            let max_length = config.resolve_length(atom.element, other.element);
            if max_length < config.max_bond_length && atom.distance_to(other) > max_length {
                continue;
            }
            found.push(bond);
        }
    }
    found
}
