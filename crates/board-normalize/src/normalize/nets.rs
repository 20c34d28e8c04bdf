use crate::snapshot::NetInfo;

/// Net names sorted ascending with duplicates removed. A net's position in
/// this list is its canonical index; host net codes are never used.
pub fn collect(nets: &[NetInfo]) -> Vec<String> {
    let mut names: Vec<String> = nets.iter().map(|n| n.name.clone()).collect();
    names.sort();
    names.dedup();
    names
}
