use pharmastock_core::Aggregate;

/// Run `command` against `aggregate` and fold the resulting entries in.
///
/// Nothing is applied unless `handle` succeeds. Returns the applied entries
/// so callers can append them to a ledger or publish them.
pub fn execute<A: Aggregate>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error> {
    let entries = aggregate.handle(command)?;
    entries.iter().for_each(|entry| aggregate.apply(entry));
    Ok(entries)
}
