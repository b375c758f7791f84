//! Constructor selection.

use crate::core::PartitionedConstructor;
use std::cmp::Ordering;

/// Pick the constructing member among `candidates`.
///
/// Most injectable parameters wins, then most total parameters, then the
/// earliest source declaration. The order is total, so the choice never
/// depends on iteration order.
///
/// Non-factory components only offer fully-injectable constructors here,
/// where injectable and total counts agree. The total-parameter tie-break
/// therefore only separates candidates of a factory-marked component.
pub fn select_best_constructor(
    candidates: &[PartitionedConstructor],
) -> Option<&PartitionedConstructor> {
    candidates.iter().min_by(|a, b| compare_constructors(a, b))
}

/// `Less` means `a` is preferred over `b`.
pub fn compare_constructors(a: &PartitionedConstructor, b: &PartitionedConstructor) -> Ordering {
    b.injectable_count()
        .cmp(&a.injectable_count())
        .then_with(|| b.parameters.len().cmp(&a.parameters.len()))
        .then_with(|| a.declaration_index.cmp(&b.declaration_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClassifiedParameter, ParameterClass};
    use crate::model::TypeRef;

    fn ctor(index: usize, injectable: usize, runtime: usize) -> PartitionedConstructor {
        let mut parameters = Vec::new();
        for i in 0..injectable {
            parameters.push(ClassifiedParameter {
                name: format!("dep{}", i),
                ty: TypeRef::simple("Dep"),
                class: ParameterClass::Injectable {
                    dependency: crate::core::DependencyRef {
                        position: i,
                        parameter: format!("dep{}", i),
                        declared: TypeRef::simple("Dep"),
                        capability: TypeRef::simple("Dep"),
                        key: None,
                        kind: crate::core::DependencyKind::Single,
                    },
                },
            });
        }
        for i in 0..runtime {
            parameters.push(ClassifiedParameter {
                name: format!("value{}", i),
                ty: TypeRef::simple("u32"),
                class: ParameterClass::RuntimeSupplied,
            });
        }
        PartitionedConstructor {
            declaration_index: index,
            parameters,
        }
    }

    #[test]
    fn test_most_injectable_wins() {
        let candidates = vec![ctor(0, 1, 0), ctor(1, 2, 0)];
        assert_eq!(select_best_constructor(&candidates).unwrap().declaration_index, 1);
    }

    #[test]
    fn test_tie_broken_by_total_parameters() {
        let candidates = vec![ctor(0, 2, 0), ctor(1, 2, 1)];
        assert_eq!(select_best_constructor(&candidates).unwrap().declaration_index, 1);
    }

    #[test]
    fn test_full_tie_broken_by_declaration_order() {
        let candidates = vec![ctor(3, 2, 0), ctor(1, 2, 0), ctor(2, 2, 0)];
        assert_eq!(select_best_constructor(&candidates).unwrap().declaration_index, 1);
    }

    #[test]
    fn test_no_candidates() {
        assert!(select_best_constructor(&[]).is_none());
    }
}
