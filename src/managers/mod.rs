// tabshell owned components
// The tab state machine owns all writes to the stores and ledgers below;
// the bridge layer only reads them.

pub mod download_ledger;
pub mod history_ledger;
pub mod id_allocator;
pub mod permission_ledger;
pub mod tab_state;
