//! Property tests for the tree builders and the pipeline.

use dendra_core::{
    AverageLinkage, BinaryPartitionTree, CompleteLinkage, Counter, Criterion, EdgeGraph,
    Hierarchy, LinkageKind, PipelineBuilder, RegionAdjacencyGraph, SingleLinkage,
    UndirectedGraph, binary_partition_tree, bpt_canonical, four_adjacency_edges,
    watershed_hierarchy, watershed_labels,
};
use dendra_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use test_strategy::Arbitrary;

/// How raw bytes become edge weights; the coarser profiles force ties.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum WeightProfile {
    #[weight(3)]
    Spread,
    #[weight(2)]
    Levels,
    #[weight(1)]
    Flat,
}

impl WeightProfile {
    fn weights(self, raw: &[u8]) -> Vec<f64> {
        match self {
            Self::Spread => raw.iter().map(|&byte| f64::from(byte) / 8.0).collect(),
            Self::Levels => raw.iter().map(|&byte| f64::from(byte % 4)).collect(),
            Self::Flat => vec![1.0; raw.len()],
        }
    }
}

#[derive(Clone, Copy, Debug, Arbitrary)]
enum LinkageChoice {
    Average,
    Single,
    Complete,
}

impl From<LinkageChoice> for LinkageKind {
    fn from(choice: LinkageChoice) -> Self {
        match choice {
            LinkageChoice::Average => Self::Average,
            LinkageChoice::Single => Self::Single,
            LinkageChoice::Complete => Self::Complete,
        }
    }
}

#[derive(Clone, Debug)]
struct WeightedGraph {
    graph: UndirectedGraph,
    weights: Vec<f64>,
}

/// A grid, connected by construction, with a few extra chords that may
/// duplicate grid edges.
fn weighted_graph() -> impl Strategy<Value = WeightedGraph> {
    (1_usize..5, 1_usize..6)
        .prop_flat_map(|(rows, cols)| {
            let vertices = rows * cols;
            (
                Just((rows, cols)),
                proptest::collection::vec((0..vertices, 0..vertices), 0..6),
                proptest::collection::vec(any::<u8>(), 48),
                any::<WeightProfile>(),
            )
        })
        .prop_map(|((rows, cols), chords, raw, profile)| {
            let mut pairs = four_adjacency_edges(rows, cols);
            pairs.extend(chords.into_iter().filter(|(source, target)| source != target));
            let graph =
                UndirectedGraph::with_edges(rows * cols, pairs).expect("pairs are in range");
            let weights = profile.weights(&raw[..graph.edge_count()]);
            WeightedGraph { graph, weights }
        })
}

fn config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

fn check_hierarchy(hierarchy: &Hierarchy, leaves: usize) -> Result<(), TestCaseError> {
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    prop_assert_eq!(tree.num_leaves(), leaves);
    prop_assert_eq!(altitudes.len(), tree.node_count());
    let roots = (0..tree.node_count()).filter(|&node| tree.is_root(node)).count();
    prop_assert_eq!(roots, 1);
    prop_assert_eq!(tree.root(), tree.node_count() - 1);
    for node in 0..tree.node_count() {
        let parent = tree.parent(node);
        if parent != node {
            prop_assert!(parent > node, "parent {} of {} must come later", parent, node);
            prop_assert!(altitudes[node] <= altitudes[parent]);
        }
    }
    Ok(())
}

fn check_binary(partition: &BinaryPartitionTree, leaves: usize) -> Result<(), TestCaseError> {
    check_hierarchy(partition.hierarchy(), leaves)?;
    let tree = partition.tree();
    prop_assert_eq!(tree.node_count(), 2 * leaves - 1);
    prop_assert_eq!(partition.merge_edges().len(), leaves - 1);
    for node in tree.internal_nodes() {
        prop_assert_eq!(tree.children(node).len(), 2);
    }
    Ok(())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

proptest! {
    #![proptest_config(config(128))]

    #[test]
    fn canonical_tree_is_a_minimum_spanning_dendrogram(input in weighted_graph()) {
        let vertices = input.graph.vertex_count();
        let partition = bpt_canonical(&input.graph, &input.weights).expect("grid is connected");
        check_binary(&partition, vertices)?;
        for (offset, merge) in partition.merge_edges().iter().enumerate() {
            prop_assert_eq!(partition.altitudes()[vertices + offset], input.weights[merge.edge()]);
            let edge = input.graph.edge(merge.edge()).expect("merge edges are live");
            prop_assert_eq!((edge.source(), edge.target()), (merge.source(), merge.target()));
        }
    }

    #[test]
    fn single_linkage_matches_canonical_altitudes(input in weighted_graph()) {
        let canonical = bpt_canonical(&input.graph, &input.weights).expect("grid is connected");
        let greedy = binary_partition_tree(
            &input.graph,
            &input.weights,
            &mut SingleLinkage::new(&input.weights),
        )
        .expect("grid is connected");
        prop_assert_eq!(sorted(canonical.altitudes()), sorted(greedy.altitudes()));
    }

    #[test]
    fn every_linkage_builds_a_monotone_binary_tree(
        input in weighted_graph(),
        choice in any::<LinkageChoice>(),
    ) {
        let vertices = input.graph.vertex_count();
        let weights = &input.weights;
        let partition = match LinkageKind::from(choice) {
            LinkageKind::Average => {
                let counts = vec![1.0; weights.len()];
                let mut linkage = AverageLinkage::new(weights, &counts).expect("unit counts");
                binary_partition_tree(&input.graph, weights, &mut linkage)
            }
            LinkageKind::Single => {
                binary_partition_tree(&input.graph, weights, &mut SingleLinkage::new(weights))
            }
            LinkageKind::Complete => {
                binary_partition_tree(&input.graph, weights, &mut CompleteLinkage::new(weights))
            }
        }
        .expect("grid is connected");
        check_binary(&partition, vertices)?;
    }

    #[test]
    fn watershed_hierarchies_are_valid(input in weighted_graph()) {
        let vertices = input.graph.vertex_count();
        let partition = bpt_canonical(&input.graph, &input.weights).expect("grid is connected");
        for criterion in [Criterion::Area, Criterion::Dynamics, Criterion::Volume] {
            let hierarchy = watershed_hierarchy(&partition, &criterion).expect("canonical tree");
            check_hierarchy(&hierarchy, vertices)?;
            let tree = hierarchy.tree();
            for node in tree.internal_nodes() {
                prop_assert!(!tree.children(node).is_empty());
                if !tree.is_root(node) {
                    prop_assert!(hierarchy.altitudes()[node] < hierarchy.altitudes()[tree.parent(node)]);
                }
            }
        }
    }

    #[test]
    fn flooding_regions_partition_the_vertices(input in weighted_graph()) {
        let vertices = input.graph.vertex_count();
        let labelling = watershed_labels(&input.graph, &input.weights).expect("finite weights");
        let rag = RegionAdjacencyGraph::from_labelling(&input.graph, &labelling)
            .expect("one label per vertex");
        let sizes = rag
            .accumulate_vertices(&vec![1.0; vertices], &Counter)
            .expect("one value per vertex");
        prop_assert_eq!(sizes.iter().sum::<f64>(), vertices as f64);
        prop_assert!(sizes.iter().all(|&size| size >= 1.0));
        prop_assert!(rag.graph().edge_count() <= input.graph.edge_count());
    }

    #[test]
    fn pipeline_hierarchy_covers_every_region(
        input in weighted_graph(),
        choice in any::<LinkageChoice>(),
    ) {
        let segmentation = PipelineBuilder::new()
            .with_linkage(choice.into())
            .build()
            .expect("defaults are valid")
            .run(&input.graph, &input.weights)
            .expect("grid is connected");
        let regions = segmentation.labelling().label_count();
        prop_assert_eq!(segmentation.labelling().labels().len(), input.graph.vertex_count());
        prop_assert_eq!(segmentation.rag().region_count(), regions);
        check_binary(segmentation.partition_tree(), regions)?;
    }
}
