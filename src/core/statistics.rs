/*!

Engine-scoped measurement counters. One `EngineStatistics` lives in each `Engine`, so concurrent
decision runs stay independent; nothing here is global. The counters are cheap enough to keep
unconditionally and are exposed through a dump hook that the engine invokes but does not format.

The `measure_list!` macro keeps each group's list of measures in one place and generates the
counter struct, its `record_*` increment methods, and the enumeration hook.

*/

/// Generates a counter struct with a `record_<name>` method per measure and a `for_each`
/// enumeration hook.
macro_rules! measure_list {
  ($(#[$struct_meta:meta])* $name:ident { $($measure:ident),* $(,)? }) => {
    paste::paste! {
      $(#[$struct_meta])*
      #[derive(Clone, Default, Debug)]
      pub struct $name {
        $( pub $measure: usize, )*
      }

      impl $name {
        $(
          #[inline(always)]
          pub fn [<record_ $measure>](&mut self) {
            self.$measure += 1;
          }
        )*

        /// Invokes `hook` with each measure's name and current value.
        pub fn for_each(&self, hook: &mut dyn FnMut(&'static str, usize)) {
          $( hook(stringify!($measure), self.$measure); )*
        }
      }
    }
  };
}

measure_list!(
  /// Per-variant counts of minted term instances.
  TermInstanceMeasures {
    empty,
    product,
    base_set,
    list,
    fixpoint,
    fixpoint_pre,
    continuation,
  }
);

measure_list!(
  /// Outcomes of structural comparisons (equality and subsumption).
  ComparisonMeasures {
    by_same_pointer,
    by_different_type,
    by_structure_true,
    by_structure_false,
  }
);

measure_list!(
  /// Traffic of the subsumption machinery.
  SubsumptionMeasures {
    cache_hits,
    subsumed_by_hits,
    pruned_members,
  }
);

measure_list!(
  /// Continuation forcing, total and by site.
  UnfoldingMeasures {
    total,
    in_subsumption,
    in_intersection,
  }
);

measure_list!(
  /// Postponed work items: deferred on an unknown subsumption answer, resolved later.
  PostponedMeasures {
    admitted,
    processed,
  }
);

#[derive(Clone, Default, Debug)]
pub struct EngineStatistics {
  pub instances:   TermInstanceMeasures,
  pub comparisons: ComparisonMeasures,
  pub subsumption: SubsumptionMeasures,
  pub unfolding:   UnfoldingMeasures,
  pub postponed:   PostponedMeasures,
}

impl EngineStatistics {
  /// Invokes `hook` with `(group, measure, value)` for every counter. The caller formats.
  pub fn for_each_measure(&self, hook: &mut dyn FnMut(&'static str, &'static str, usize)) {
    self.instances.for_each(&mut |name, value| hook("instances", name, value));
    self.comparisons.for_each(&mut |name, value| hook("comparisons", name, value));
    self.subsumption.for_each(&mut |name, value| hook("subsumption", name, value));
    self.unfolding.for_each(&mut |name, value| hook("unfolding", name, value));
    self.postponed.for_each(&mut |name, value| hook("postponed", name, value));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_methods_increment_their_measure() {
    let mut measures = UnfoldingMeasures::default();
    measures.record_total();
    measures.record_total();
    measures.record_in_subsumption();

    assert_eq!(measures.total, 2);
    assert_eq!(measures.in_subsumption, 1);
    assert_eq!(measures.in_intersection, 0);
  }

  #[test]
  fn enumeration_visits_every_group() {
    let statistics = EngineStatistics::default();
    let mut groups = Vec::new();
    statistics.for_each_measure(&mut |group, _name, value| {
      assert_eq!(value, 0);
      groups.push(group);
    });

    for expected in ["instances", "comparisons", "subsumption", "unfolding", "postponed"] {
      assert!(groups.contains(&expected));
    }
  }
}
