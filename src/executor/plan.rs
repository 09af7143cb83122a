//! Evaluation plans for quarrydb
//!
//! A plan is a small tree of nodes. Scan, filter and index-lookup nodes
//! produce a pipeline of (relation, handles); a projection node on top
//! materialises rows. The optimizer rewrites a filter directly above a
//! scan into an index lookup when an index's key columns are exactly the
//! predicate's columns.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::storage::{BTreeIndex, Handle, HeapTable, Row};

/// A tree of evaluation nodes
#[derive(Debug)]
pub enum EvalPlan {
    /// All handles of a relation
    TableScan {
        table_name: String,
        relation: Arc<Mutex<HeapTable>>,
    },
    /// Handles of the child whose rows match an equality conjunction
    Select {
        predicate: Row,
        child: Box<EvalPlan>,
    },
    /// Handles matching a key via an index probe
    IndexLookup { index: BTreeIndex, key: Row },
    /// Materialised rows, restricted to the named columns
    Project {
        columns: Vec<String>,
        child: Box<EvalPlan>,
    },
}

/// Intermediate result of evaluating a non-projection node
pub struct Pipeline {
    pub relation: Arc<Mutex<HeapTable>>,
    pub handles: Vec<Handle>,
}

impl EvalPlan {
    /// Rewrite Select-over-TableScan into an index lookup when some index
    /// on the relation has exactly the predicate's columns as its key
    /// (first match in `_indices` iteration order wins). Mixed predicates
    /// are never decomposed; they fall through to scan-and-filter.
    pub fn optimize(self, catalog: &mut Catalog) -> Result<EvalPlan> {
        match self {
            EvalPlan::Project { columns, child } => Ok(EvalPlan::Project {
                columns,
                child: Box::new(child.optimize(catalog)?),
            }),
            EvalPlan::Select { predicate, child } => match *child {
                EvalPlan::TableScan {
                    table_name,
                    relation,
                } => {
                    let predicate_columns: HashSet<&String> = predicate.keys().collect();
                    for index_name in catalog.get_index_names(&table_name)? {
                        let index = catalog.get_index(&table_name, &index_name)?;
                        let key_columns: HashSet<&String> =
                            index.key_columns().iter().collect();
                        if key_columns == predicate_columns {
                            tracing::debug!(
                                table = %table_name,
                                index = %index_name,
                                "predicate pushed down to index lookup"
                            );
                            return Ok(EvalPlan::IndexLookup {
                                index,
                                key: predicate,
                            });
                        }
                    }
                    Ok(EvalPlan::Select {
                        predicate,
                        child: Box::new(EvalPlan::TableScan {
                            table_name,
                            relation,
                        }),
                    })
                }
                other => Ok(EvalPlan::Select {
                    predicate,
                    child: Box::new(other.optimize(catalog)?),
                }),
            },
            other => Ok(other),
        }
    }

    /// Evaluate this node into a (relation, handles) pipeline.
    pub fn pipeline(&mut self) -> Result<Pipeline> {
        match self {
            EvalPlan::TableScan { relation, .. } => {
                let handles = relation.lock().unwrap().select()?;
                Ok(Pipeline {
                    relation: relation.clone(),
                    handles,
                })
            }
            EvalPlan::Select { predicate, child } => {
                let pipeline = child.pipeline()?;
                let mut handles = Vec::new();
                for handle in pipeline.handles {
                    let row = pipeline.relation.lock().unwrap().project(handle)?;
                    if predicate
                        .iter()
                        .all(|(column, value)| row.get(column) == Some(value))
                    {
                        handles.push(handle);
                    }
                }
                Ok(Pipeline {
                    relation: pipeline.relation,
                    handles,
                })
            }
            EvalPlan::IndexLookup { index, key } => {
                let handles = index.lookup(key)?;
                Ok(Pipeline {
                    relation: index.relation().clone(),
                    handles,
                })
            }
            EvalPlan::Project { .. } => Err(Error::Exec(
                "a projection does not produce a handle pipeline".to_string(),
            )),
        }
    }

    /// Evaluate a projection root into materialised rows.
    pub fn evaluate(&mut self) -> Result<Vec<Row>> {
        match self {
            EvalPlan::Project { columns, child } => {
                let pipeline = child.pipeline()?;
                let mut rows = Vec::with_capacity(pipeline.handles.len());
                for handle in pipeline.handles {
                    rows.push(
                        pipeline
                            .relation
                            .lock()
                            .unwrap()
                            .project_columns(handle, columns)?,
                    );
                }
                Ok(rows)
            }
            other => {
                let pipeline = other.pipeline()?;
                let mut rows = Vec::with_capacity(pipeline.handles.len());
                for handle in pipeline.handles {
                    rows.push(pipeline.relation.lock().unwrap().project(handle)?);
                }
                Ok(rows)
            }
        }
    }
}
