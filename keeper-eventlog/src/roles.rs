/// Roles gained and lost between two member snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub added: Vec<u64>,
    pub removed: Vec<u64>,
}

impl RoleChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub fn diff_roles(before: &[u64], after: &[u64]) -> RoleChanges {
    let mut added: Vec<u64> = after
        .iter()
        .filter(|role| !before.contains(role))
        .copied()
        .collect();
    let mut removed: Vec<u64> = before
        .iter()
        .filter(|role| !after.contains(role))
        .copied()
        .collect();

    added.sort_unstable();
    added.dedup();
    removed.sort_unstable();
    removed.dedup();

    RoleChanges { added, removed }
}

#[cfg(test)]
mod tests {
    use super::diff_roles;

    #[test]
    fn added_and_removed_roles() {
        let changes = diff_roles(&[1, 2, 3], &[3, 4, 2, 5]);
        assert_eq!(changes.added, vec![4, 5]);
        assert_eq!(changes.removed, vec![1]);
    }

    #[test]
    fn reordering_is_not_a_change() {
        assert!(diff_roles(&[1, 2], &[2, 1]).is_empty());
    }
}
