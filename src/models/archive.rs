use uuid::Uuid;

use super::{PendingSignature, PendingValidation};

/// Live-store queue tables that the pruner deletes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveQueue {
    Signatures,
    Validations,
}

impl LiveQueue {
    pub fn table_name(&self) -> &'static str {
        match self {
            LiveQueue::Signatures => "signatures_pending",
            LiveQueue::Validations => "validations_pending",
        }
    }
}

impl std::fmt::Display for LiveQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Archive-store tables, one per archive record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveTable {
    /// Signatures that expired without ever being validated
    SignaturesNotValidated,
    /// Signatures whose validation completed
    SignaturesProcessed,
    /// Validation tokens belonging to processed signatures
    ValidationsProcessed,
    /// Validation tokens with no matching signature
    ValidationsOrphaned,
}

impl ArchiveTable {
    pub const ALL: [ArchiveTable; 4] = [
        ArchiveTable::SignaturesNotValidated,
        ArchiveTable::SignaturesProcessed,
        ArchiveTable::ValidationsProcessed,
        ArchiveTable::ValidationsOrphaned,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ArchiveTable::SignaturesNotValidated => "signatures_not_validated_archive",
            ArchiveTable::SignaturesProcessed => "signatures_processed_archive",
            ArchiveTable::ValidationsProcessed => "validations_processed_archive",
            ArchiveTable::ValidationsOrphaned => "validations_orphaned_archive",
        }
    }
}

impl std::fmt::Display for ArchiveTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A row on its way into the archive store.
///
/// The variant decides the destination table; the payload is the live row
/// copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveRecord {
    NotValidatedSignature(PendingSignature),
    ProcessedSignature(PendingSignature),
    ProcessedValidation(PendingValidation),
    OrphanedValidation(PendingValidation),
}

impl ArchiveRecord {
    pub fn id(&self) -> Uuid {
        match self {
            ArchiveRecord::NotValidatedSignature(s) | ArchiveRecord::ProcessedSignature(s) => s.id,
            ArchiveRecord::ProcessedValidation(v) | ArchiveRecord::OrphanedValidation(v) => v.id,
        }
    }

    pub fn table(&self) -> ArchiveTable {
        match self {
            ArchiveRecord::NotValidatedSignature(_) => ArchiveTable::SignaturesNotValidated,
            ArchiveRecord::ProcessedSignature(_) => ArchiveTable::SignaturesProcessed,
            ArchiveRecord::ProcessedValidation(_) => ArchiveTable::ValidationsProcessed,
            ArchiveRecord::OrphanedValidation(_) => ArchiveTable::ValidationsOrphaned,
        }
    }
}

/// A homogeneous batch of archive records bound for a single table.
///
/// Constructors take the live rows of one category, so a batch can never mix
/// destinations.
#[derive(Debug, Clone)]
pub struct ArchiveBatch {
    table: ArchiveTable,
    records: Vec<ArchiveRecord>,
}

impl ArchiveBatch {
    pub fn not_validated_signatures(rows: Vec<PendingSignature>) -> Self {
        Self {
            table: ArchiveTable::SignaturesNotValidated,
            records: rows
                .into_iter()
                .map(ArchiveRecord::NotValidatedSignature)
                .collect(),
        }
    }

    pub fn processed_signatures(rows: Vec<PendingSignature>) -> Self {
        Self {
            table: ArchiveTable::SignaturesProcessed,
            records: rows
                .into_iter()
                .map(ArchiveRecord::ProcessedSignature)
                .collect(),
        }
    }

    pub fn processed_validations(rows: Vec<PendingValidation>) -> Self {
        Self {
            table: ArchiveTable::ValidationsProcessed,
            records: rows
                .into_iter()
                .map(ArchiveRecord::ProcessedValidation)
                .collect(),
        }
    }

    pub fn orphaned_validations(rows: Vec<PendingValidation>) -> Self {
        Self {
            table: ArchiveTable::ValidationsOrphaned,
            records: rows
                .into_iter()
                .map(ArchiveRecord::OrphanedValidation)
                .collect(),
        }
    }

    pub fn table(&self) -> ArchiveTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of every record in the batch, in selection order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.records.iter().map(ArchiveRecord::id).collect()
    }

    pub fn records(&self) -> &[ArchiveRecord] {
        &self.records
    }
}
