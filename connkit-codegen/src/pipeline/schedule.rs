//! Topological ordering of generators from their role declarations.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{Generator, ScheduleError};
use crate::roles::Role;

/// Order `generators` so every consumer of a role runs after its producers.
///
/// Producers of the same role keep their insertion order, forming the
/// layering chain. A generator that both requires and provides a role only
/// needs an earlier producer (or a seed). Read roles order their readers
/// after every producer but need none. Ties keep insertion order.
pub fn schedule(
    generators: &[Box<dyn Generator>],
    seeds: &[Role],
) -> Result<Vec<usize>, ScheduleError> {
    let n = generators.len();
    let mut producers: IndexMap<Role, Vec<usize>> = IndexMap::new();
    for (i, generator) in generators.iter().enumerate() {
        for role in generator.provides() {
            producers.entry(*role).or_default().push(i);
        }
    }

    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for chain in producers.values() {
        for pair in chain.windows(2) {
            successors[pair[0]].insert(pair[1]);
        }
    }

    for (i, generator) in generators.iter().enumerate() {
        for role in generator.requires() {
            let chain = producers.get(role).map(Vec::as_slice).unwrap_or_default();
            let seeded = seeds.contains(role);

            if generator.provides().contains(role) {
                if !seeded && !chain.iter().any(|&p| p < i) {
                    return Err(unprovided(generator.as_ref(), *role));
                }
                continue;
            }

            if chain.is_empty() && !seeded {
                return Err(unprovided(generator.as_ref(), *role));
            }
            for &p in chain {
                successors[p].insert(i);
            }
        }

        for role in generator.reads() {
            if generator.provides().contains(role) {
                continue;
            }
            for &p in producers.get(role).map(Vec::as_slice).unwrap_or_default() {
                successors[p].insert(i);
            }
        }
    }

    let mut in_degree = vec![0usize; n];
    for next in successors.iter().flatten() {
        in_degree[*next] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &next in &successors[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < n {
        let generators = (0..n)
            .filter(|i| !order.contains(i))
            .map(|i| generators[i].name().to_string())
            .collect();
        return Err(ScheduleError::Cycle { generators });
    }

    Ok(order)
}

fn unprovided(generator: &dyn Generator, role: Role) -> ScheduleError {
    ScheduleError::Unprovided {
        generator: generator.name().to_string(),
        role,
    }
}

#[cfg(test)]
mod tests {
    use connkit_ir::ModuleDescriptor;

    use super::*;
    use crate::pipeline::{GenerationContext, GenerationError};

    struct Stub {
        name: &'static str,
        requires: Vec<Role>,
        reads: Vec<Role>,
        provides: Vec<Role>,
    }

    impl Generator for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn requires(&self) -> &[Role] {
            &self.requires
        }

        fn reads(&self) -> &[Role] {
            &self.reads
        }

        fn provides(&self) -> &[Role] {
            &self.provides
        }

        fn generate(
            &self,
            _module: &ModuleDescriptor,
            _ctx: &mut GenerationContext,
        ) -> Result<(), GenerationError> {
            Ok(())
        }
    }

    fn stub(name: &'static str, requires: &[Role], provides: &[Role]) -> Box<dyn Generator> {
        Box::new(Stub {
            name,
            requires: requires.to_vec(),
            reads: Vec::new(),
            provides: provides.to_vec(),
        })
    }

    fn reader(name: &'static str, requires: &[Role], reads: &[Role]) -> Box<dyn Generator> {
        Box::new(Stub {
            name,
            requires: requires.to_vec(),
            reads: reads.to_vec(),
            provides: Vec::new(),
        })
    }

    fn names(generators: &[Box<dyn Generator>], order: &[usize]) -> Vec<&'static str> {
        order.iter().map(|&i| generators[i].name()).collect()
    }

    #[test]
    fn test_consumer_added_first_runs_last() {
        let generators = vec![
            stub("report", &[Role::ConnectionKey], &[]),
            stub("wrap", &[Role::ModuleObject], &[Role::ModuleObject]),
            stub("key", &[], &[Role::ConnectionKey]),
        ];
        let order = schedule(&generators, &[Role::ModuleObject]).unwrap();
        assert_eq!(names(&generators, &order), ["wrap", "key", "report"]);
    }

    #[test]
    fn test_consumers_wait_for_every_layer() {
        let custom = Role::Custom("docs");
        let generators = vec![
            stub("a", &[Role::ModuleObject], &[Role::ModuleObject]),
            stub("caps", &[Role::ModuleObject], &[]),
            stub("b", &[Role::ModuleObject], &[Role::ModuleObject, custom]),
            stub("docs", &[custom], &[]),
        ];
        let order = schedule(&generators, &[Role::ModuleObject]).unwrap();
        assert_eq!(names(&generators, &order), ["a", "b", "caps", "docs"]);
    }

    #[test]
    fn test_readers_follow_late_producers() {
        let generators = vec![
            stub("manager", &[Role::ModuleObject], &[Role::ModuleObject, Role::ConnectionKey]),
            reader("processors", &[Role::ModuleObject], &[Role::ConnectionKey]),
            stub("rekey", &[Role::ConnectionKey], &[Role::ConnectionKey]),
        ];
        let order = schedule(&generators, &[Role::ModuleObject]).unwrap();
        assert_eq!(names(&generators, &order), ["manager", "rekey", "processors"]);
    }

    #[test]
    fn test_reads_need_no_producer() {
        let generators = vec![reader("caps", &[], &[Role::PoolObject])];
        assert_eq!(schedule(&generators, &[]).unwrap(), [0]);
    }

    #[test]
    fn test_cycle() {
        let x = Role::Custom("x");
        let y = Role::Custom("y");
        let generators = vec![stub("a", &[x], &[y]), stub("b", &[y], &[x])];
        let err = schedule(&generators, &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::Cycle { ref generators } if generators.len() == 2));
    }

    #[test]
    fn test_unprovided() {
        let generators = vec![stub("a", &[Role::PoolObject], &[])];
        let err = schedule(&generators, &[Role::ModuleObject]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "generator 'a' requires role 'pool-object' but no earlier generator provides it"
        );
    }

    #[test]
    fn test_wrapper_without_seed() {
        let generators = vec![stub("wrap", &[Role::Config], &[Role::Config])];
        assert!(matches!(
            schedule(&generators, &[]),
            Err(ScheduleError::Unprovided { .. })
        ));
    }
}
