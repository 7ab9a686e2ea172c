//! Row processing: one spreadsheet row in, one group (and an annotation) out

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::{DirectoryService, GroupRequest, Operation, OperationResult, Restriction};

use super::excel::Spreadsheet;
use super::report::RunReporter;
use super::schema::{ColumnMap, DETAILS_HEADER, STATUS_HEADER};
use super::types::{GroupSpec, RowOutcome, RowState};

/// How members are added to a new group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionMode {
    /// Create the group empty, then add members one call at a time.
    /// A failing member is reported on its own.
    #[default]
    Incremental,
    /// Pass every member to the create call. A bad member fails the group.
    Batch,
}

/// Options controlling how each row is provisioned
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub mode: ProvisionMode,
    pub hide_from_address_lists: bool,
    pub join_restriction: Restriction,
    pub depart_restriction: Restriction,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            mode: ProvisionMode::Incremental,
            hide_from_address_lists: true,
            join_restriction: Restriction::Closed,
            depart_restriction: Restriction::Closed,
        }
    }
}

/// Provisions groups against a directory, one row at a time
pub struct RowProcessor<'a> {
    directory: &'a dyn DirectoryService,
    options: ProcessorOptions,
}

impl<'a> RowProcessor<'a> {
    pub fn new(directory: &'a dyn DirectoryService, options: ProcessorOptions) -> Self {
        Self { directory, options }
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn group_request(&self, spec: &GroupSpec) -> GroupRequest {
        let members = match self.options.mode {
            ProvisionMode::Incremental => Vec::new(),
            ProvisionMode::Batch => spec.members.clone(),
        };

        GroupRequest {
            display_name: spec.display_name.clone(),
            address: spec.address.clone(),
            owner: spec.owner.clone(),
            join_restriction: self.options.join_restriction,
            depart_restriction: self.options.depart_restriction,
            members,
        }
    }

    fn enter(&self, spec: &GroupSpec, state: &mut RowState, next: RowState) {
        let previous = *state;
        if state.advance(next) {
            log::debug!("Row {} ({}): {:?} -> {:?}", spec.row, spec.address, previous, next);
        }
    }

    /// Provision a single group. Directory failures never escape; they
    /// are recorded in the returned outcome.
    pub async fn process(&self, spec: &GroupSpec) -> RowOutcome {
        let mut state = RowState::Pending;
        let mut operations = Vec::new();

        self.enter(spec, &mut state, RowState::Creating);
        let request = self.group_request(spec);
        let created = self.directory.create_group(&request).await;
        record(
            &mut operations,
            Operation::create_group(&spec.address, request.members.clone()),
            &created,
        );

        let group = match created {
            Ok(group) => group,
            Err(err) => {
                log::warn!("Row {}: failed to create {}: {}", spec.row, spec.address, err);
                let outcome = RowOutcome::from_operations(spec, operations);
                self.enter(spec, &mut state, RowState::Done(outcome.status));
                return outcome;
            }
        };

        log::info!("Row {}: created group {}", spec.row, spec.address);
        let misassigned = group.assigned_elsewhere().map(|mail| {
            log::warn!(
                "Row {}: {} was created with address {}",
                spec.row,
                spec.address,
                mail
            );
            format!("Group was created with address {} instead of {}", mail, spec.address)
        });
        self.enter(spec, &mut state, RowState::AddingMembers);

        if self.options.mode == ProvisionMode::Incremental {
            for member in &spec.members {
                let added = self.directory.add_member(&group, member).await;
                if let Err(err) = &added {
                    log::warn!(
                        "Row {}: failed to add {} to {}: {}",
                        spec.row,
                        member,
                        spec.address,
                        err
                    );
                }
                record(
                    &mut operations,
                    Operation::add_member(&spec.address, member.as_str()),
                    &added,
                );
            }
        }

        if self.options.hide_from_address_lists {
            let hidden = self.directory.set_hidden(&group, true).await;
            if let Err(err) = &hidden {
                log::warn!(
                    "Row {}: failed to hide {} from address lists: {}",
                    spec.row,
                    spec.address,
                    err
                );
            }
            record(
                &mut operations,
                Operation::set_hidden(&spec.address, true),
                &hidden,
            );
        }

        let mut outcome = RowOutcome::from_operations(spec, operations);
        if let Some(issue) = misassigned {
            outcome = outcome.with_issue(issue);
        }
        self.enter(spec, &mut state, RowState::Done(outcome.status));
        outcome
    }
}

fn record<T>(
    operations: &mut Vec<OperationResult>,
    operation: Operation,
    outcome: &anyhow::Result<T>,
) {
    log::debug!(
        "{} {} for {}: {}",
        operation.http_method(),
        operation.operation_type(),
        operation.group(),
        if outcome.is_ok() { "ok" } else { "failed" }
    );
    operations.push(OperationResult::from_outcome(operation, outcome));
}

/// Annotation column positions for a sheet.
///
/// Existing Status/Details columns are reused, otherwise both are
/// appended after the last used column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationColumns {
    pub status: usize,
    pub details: usize,
}

impl AnnotationColumns {
    pub fn prepare(sheet: &mut Spreadsheet, columns: &ColumnMap) -> Self {
        let mut next = sheet.column_count();
        let mut place = |existing: Option<usize>| {
            existing.unwrap_or_else(|| {
                let col = next;
                next += 1;
                col
            })
        };

        let annotations = Self {
            status: place(columns.status),
            details: place(columns.details),
        };
        sheet.set_value(0, annotations.status, STATUS_HEADER);
        sheet.set_value(0, annotations.details, DETAILS_HEADER);
        annotations
    }

    /// Write the outcome of one row
    pub fn write(&self, sheet: &mut Spreadsheet, outcome: &RowOutcome) {
        let row = outcome.row - 1;
        sheet.set_value(row, self.status, outcome.status.to_string());
        sheet.set_value(row, self.details, outcome.details_text());
        sheet.set_row_fill(row, outcome.status);
    }
}

/// Read every data row of `sheet` as a GroupSpec, skipping blank addresses
pub fn read_group_specs(sheet: &Spreadsheet, columns: &ColumnMap) -> Vec<GroupSpec> {
    (1..sheet.row_count())
        .filter_map(|row| {
            let spec = columns.group_spec(row + 1, sheet.row(row));
            if spec.is_none() {
                log::debug!("Skipping row {}: no group address", row + 1);
            }
            spec
        })
        .collect()
}

/// Process every data row of `sheet` in order, annotating as it goes
pub async fn process_sheet(
    sheet: &mut Spreadsheet,
    processor: &RowProcessor<'_>,
    reporter: &mut RunReporter,
) -> Result<()> {
    if sheet.row_count() == 0 {
        bail!("Spreadsheet is empty: {}", sheet.source().display());
    }

    let columns = ColumnMap::resolve(sheet.headers())?;
    if columns.has_annotations() {
        log::warn!(
            "Input already has a {} column; every row will be provisioned again",
            STATUS_HEADER
        );
    }

    let specs = read_group_specs(sheet, &columns);
    let annotations = AnnotationColumns::prepare(sheet, &columns);
    log::info!(
        "Provisioning {} groups from '{}' ({:?} mode)",
        specs.len(),
        sheet.sheet_name(),
        processor.options().mode
    );

    let mut seen = HashSet::new();
    for spec in &specs {
        if !seen.insert(spec.address.to_lowercase()) {
            log::warn!(
                "Row {}: {} appears more than once in this sheet",
                spec.row,
                spec.address
            );
        }

        let outcome = processor.process(spec).await;
        annotations.write(sheet, &outcome);
        reporter.record(&outcome);
    }

    sheet.autofit();
    Ok(())
}
