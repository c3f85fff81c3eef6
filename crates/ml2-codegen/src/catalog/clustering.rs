//! Clustering estimators.
//!
//! All of them fit on `X_train` only. DBSCAN and spectral clustering have
//! no `predict`; the plan labels new rows through a nearest-neighbour
//! lookup instead (see `GenerationPlan::uses_neighbor_lookup`).

use crate::binder::{Binder, Field};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{
    Affinity, DbscanParams, DistanceMetric, GaussianMixtureParams, KMeansParams,
    MiniBatchKMeansParams, NeighborAlgorithm, SpectralClusteringParams,
};
use crate::render::{Fragment, Literal};

use super::EstimatorCall;

/// Row count above which mini-batch k-means pays off.
pub(crate) const MINI_BATCH_HINT_ROWS: u64 = 10_000;
const BATCH_THRESHOLD: u64 = 100_000;

fn at_least(value: Option<i64>, min: i64) -> bool {
    value.is_none_or(|v| v >= min)
}

fn non_negative(value: Option<f64>) -> bool {
    value.is_none_or(|v| v >= 0.0)
}

pub(super) fn kmeans(
    p: &KMeansParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("KMeans", automl, diagnostics);
    if automl {
        b.info(
            DiagnosticKind::Suggestion,
            format!(
                "for datasets above {MINI_BATCH_HINT_ROWS} rows consider MiniBatchKMeans, which trains much faster"
            ),
        );
    }
    b.bind(
        Field::new("n_clusters", p.n_clusters)
            .range(at_least(p.n_clusters, 1), "n_clusters must be at least 1"),
    );
    b.bind(Field::new("init", p.init));
    b.bind(Field::new("n_init", p.n_init).range(at_least(p.n_init, 1), "n_init must be at least 1"));
    b.bind(
        Field::new("max_iter", p.max_iter)
            .range(at_least(p.max_iter, 1), "max_iter must be at least 1"),
    );
    b.bind(Field::new("tol", p.tol).range(non_negative(p.tol), "tol must be non-negative"));
    b.bind(Field::new("verbose", p.verbose));
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("copy_x", p.copy_x));
    b.bind(Field::new("algorithm", p.algorithm));
    EstimatorCall::new("sklearn.cluster", "KMeans", b.finish())
}

pub(super) fn mini_batch_kmeans(
    p: &MiniBatchKMeansParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("MiniBatchKMeans", automl, diagnostics);
    b.bind(
        Field::new("n_clusters", p.n_clusters)
            .range(at_least(p.n_clusters, 1), "n_clusters must be at least 1"),
    );
    b.bind(Field::new("init", p.init));
    b.bind(
        Field::new("max_iter", p.max_iter)
            .range(at_least(p.max_iter, 1), "max_iter must be at least 1"),
    );
    b.bind(
        Field::new("batch_size", p.batch_size)
            .automl(Fragment::by_sample_count(
                BATCH_THRESHOLD,
                Literal::Int(1024),
                Literal::Int(4096),
            ))
            .range(at_least(p.batch_size, 1), "batch_size must be at least 1"),
    );
    b.bind(Field::new("verbose", p.verbose));
    b.bind(Field::new("compute_labels", p.compute_labels));
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("tol", p.tol).range(non_negative(p.tol), "tol must be non-negative"));
    b.bind(
        Field::new("max_no_improvement", p.max_no_improvement).range(
            at_least(p.max_no_improvement, 0),
            "max_no_improvement must be non-negative",
        ),
    );
    b.bind(
        Field::new("init_size", p.init_size)
            .require(
                p.init_size.is_none_or(|size| p.n_clusters.is_none_or(|k| size >= k)),
                "init_size must not be smaller than n_clusters",
            )
            .range(at_least(p.init_size, 1), "init_size must be at least 1"),
    );
    b.bind(Field::new("n_init", p.n_init).range(at_least(p.n_init, 1), "n_init must be at least 1"));
    b.bind(
        Field::new("reassignment_ratio", p.reassignment_ratio).range(
            non_negative(p.reassignment_ratio),
            "reassignment_ratio must be non-negative",
        ),
    );
    EstimatorCall::new("sklearn.cluster", "MiniBatchKMeans", b.finish())
}

pub(super) fn dbscan(
    p: &DbscanParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let metric = p.metric.unwrap_or(DistanceMetric::Euclidean);
    let algorithm_ok =
        !(p.algorithm == Some(NeighborAlgorithm::KdTree) && metric == DistanceMetric::Cosine);
    let algorithm = if algorithm_ok {
        p.algorithm.unwrap_or(NeighborAlgorithm::Auto)
    } else {
        NeighborAlgorithm::Auto
    };

    let mut b = Binder::new("DBSCAN", automl, diagnostics);
    b.bind(Field::new("eps", p.eps).range(p.eps.is_none_or(|e| e > 0.0), "eps must be positive"));
    b.bind(
        Field::new("min_samples", p.min_samples)
            // Only reached when array features hide the column count until
            // run time; otherwise the AutoML upgrade has filled the field.
            .automl(Literal::raw("2 * n_features"))
            .range(at_least(p.min_samples, 1), "min_samples must be at least 1"),
    );
    b.bind(Field::new("metric", p.metric));
    b.bind(
        Field::new("algorithm", p.algorithm)
            .require(algorithm_ok, "kd_tree does not support the cosine metric"),
    );
    b.bind(
        Field::new("leaf_size", p.leaf_size)
            .require(
                matches!(
                    algorithm,
                    NeighborAlgorithm::BallTree | NeighborAlgorithm::KdTree
                ),
                "leaf_size only applies to algorithm 'ball_tree' or 'kd_tree'",
            )
            .range(at_least(p.leaf_size, 1), "leaf_size must be at least 1"),
    );
    b.bind(
        Field::new("p", p.p)
            .require(
                metric == DistanceMetric::Minkowski,
                "p only applies to metric 'minkowski'",
            )
            .range(p.p.is_none_or(|v| v >= 1.0), "p must be at least 1"),
    );
    b.bind(Field::new("n_jobs", p.n_jobs));
    EstimatorCall::new("sklearn.cluster", "DBSCAN", b.finish())
}

pub(super) fn spectral(
    p: &SpectralClusteringParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let affinity = p.affinity.unwrap_or(Affinity::Rbf);

    let mut b = Binder::new("SpectralClustering", automl, diagnostics);
    b.bind(
        Field::new("n_clusters", p.n_clusters)
            .range(at_least(p.n_clusters, 1), "n_clusters must be at least 1"),
    );
    b.bind(Field::new("eigen_solver", p.eigen_solver));
    b.bind(
        Field::new("n_components", p.n_components)
            .range(at_least(p.n_components, 1), "n_components must be at least 1"),
    );
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("n_init", p.n_init).range(at_least(p.n_init, 1), "n_init must be at least 1"));
    b.bind(
        Field::new("gamma", p.gamma)
            .require(
                affinity != Affinity::NearestNeighbors,
                "gamma is ignored by affinity 'nearest_neighbors'",
            )
            .range(non_negative(p.gamma), "gamma must be non-negative"),
    );
    b.bind(Field::new("affinity", p.affinity));
    b.bind(
        Field::new("n_neighbors", p.n_neighbors)
            .require(
                affinity == Affinity::NearestNeighbors,
                "n_neighbors only applies to affinity 'nearest_neighbors'",
            )
            .range(at_least(p.n_neighbors, 1), "n_neighbors must be at least 1"),
    );
    b.bind(
        Field::new("eigen_tol", p.eigen_tol)
            .range(non_negative(p.eigen_tol), "eigen_tol must be non-negative"),
    );
    b.bind(Field::new("assign_labels", p.assign_labels));
    b.bind(
        Field::new("degree", p.degree)
            .require(affinity == Affinity::Poly, "degree only applies to affinity 'poly'"),
    );
    b.bind(Field::new("coef0", p.coef0).require(
        matches!(affinity, Affinity::Poly | Affinity::Sigmoid),
        "coef0 only applies to affinity 'poly' or 'sigmoid'",
    ));
    b.bind(Field::new("n_jobs", p.n_jobs));
    b.bind(Field::new("verbose", p.verbose));
    EstimatorCall::new("sklearn.cluster", "SpectralClustering", b.finish())
}

pub(super) fn gaussian_mixture(
    p: &GaussianMixtureParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("GaussianMixture", automl, diagnostics);
    b.bind(
        Field::new("n_components", p.n_components)
            .range(at_least(p.n_components, 1), "n_components must be at least 1"),
    );
    b.bind(Field::new("covariance_type", p.covariance_type));
    b.bind(Field::new("tol", p.tol).range(non_negative(p.tol), "tol must be non-negative"));
    b.bind(
        Field::new("reg_covar", p.reg_covar)
            .range(non_negative(p.reg_covar), "reg_covar must be non-negative"),
    );
    b.bind(
        Field::new("max_iter", p.max_iter)
            .range(at_least(p.max_iter, 1), "max_iter must be at least 1"),
    );
    b.bind(Field::new("n_init", p.n_init).range(at_least(p.n_init, 1), "n_init must be at least 1"));
    b.bind(Field::new("init_params", p.init_params));
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("warm_start", p.warm_start));
    b.bind(Field::new("verbose", p.verbose));
    b.bind(
        Field::new("verbose_interval", p.verbose_interval)
            .require(
                p.verbose.is_some_and(|v| v > 0),
                "verbose_interval is only used when verbose > 0",
            )
            .range(
                at_least(p.verbose_interval, 1),
                "verbose_interval must be at least 1",
            ),
    );
    EstimatorCall::new("sklearn.mixture", "GaussianMixture", b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::model::{AssignLabels, CovarianceType, EigenSolver, KMeansInit, MixtureInit};
    use crate::render::Dialect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kmeans_automl_has_no_cluster_default() {
        let mut diagnostics = Diagnostics::new();
        let call = kmeans(&KMeansParams::default(), true, &mut diagnostics);
        assert_eq!(call.constructor(), "KMeans()");
        assert_eq!(diagnostics.len(), 1);
        let hint = &diagnostics.entries()[0];
        assert_eq!(hint.severity, Severity::Info);
        assert_eq!(hint.kind, DiagnosticKind::Suggestion);
        assert!(hint.message.contains("MiniBatchKMeans"));
    }

    #[test]
    fn test_kmeans_fields() {
        let params = KMeansParams {
            n_clusters: Some(3),
            init: Some(KMeansInit::KMeansPlusPlus),
            n_init: Some(10),
            random_state: Some(0),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = kmeans(&params, false, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "KMeans(n_clusters=3, init='k-means++', n_init=10, random_state=0)"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_mini_batch_automl_batch_size() {
        let params = MiniBatchKMeansParams {
            n_clusters: Some(4),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = mini_batch_kmeans(&params, true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "n_clusters=4, batch_size=(1024 if n_samples < 100000 else 4096)"
        );
    }

    #[test]
    fn test_mini_batch_full_binding() {
        let params = MiniBatchKMeansParams {
            n_clusters: Some(8),
            init: Some(KMeansInit::Random),
            max_iter: Some(100),
            batch_size: Some(2048),
            verbose: Some(0),
            compute_labels: Some(true),
            random_state: Some(1),
            tol: Some(0.0),
            max_no_improvement: Some(10),
            init_size: Some(300),
            n_init: Some(3),
            reassignment_ratio: Some(0.01),
        };
        let mut diagnostics = Diagnostics::new();
        let call = mini_batch_kmeans(&params, true, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "MiniBatchKMeans(n_clusters=8, init='random', max_iter=100, batch_size=2048, \
             verbose=0, compute_labels=True, random_state=1, tol=0.0, max_no_improvement=10, \
             init_size=300, n_init=3, reassignment_ratio=0.01)"
        );
        assert!(diagnostics.is_empty());

        let params = MiniBatchKMeansParams {
            init_size: Some(4),
            ..params
        };
        let call = mini_batch_kmeans(&params, false, &mut diagnostics);
        assert!(!call.params.is_bound("init_size"));
        assert_eq!(diagnostics.for_field("init_size").count(), 1);
    }

    #[test]
    fn test_dbscan_full_binding() {
        let params = DbscanParams {
            eps: Some(0.3),
            min_samples: Some(10),
            metric: Some(DistanceMetric::Minkowski),
            algorithm: Some(NeighborAlgorithm::BallTree),
            leaf_size: Some(40),
            p: Some(3.0),
            n_jobs: Some(2),
        };
        let mut diagnostics = Diagnostics::new();
        let call = dbscan(&params, true, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "DBSCAN(eps=0.3, min_samples=10, metric='minkowski', algorithm='ball_tree', \
             leaf_size=40, p=3.0, n_jobs=2)"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_spectral_full_binding() {
        let params = SpectralClusteringParams {
            n_clusters: Some(4),
            eigen_solver: Some(EigenSolver::Arpack),
            n_components: Some(4),
            random_state: Some(0),
            n_init: Some(10),
            gamma: Some(0.5),
            affinity: Some(Affinity::Poly),
            n_neighbors: Some(10),
            eigen_tol: Some(0.0),
            assign_labels: Some(AssignLabels::ClusterQr),
            degree: Some(3.0),
            coef0: Some(1.0),
            n_jobs: Some(1),
            verbose: Some(false),
        };
        let mut diagnostics = Diagnostics::new();
        let call = spectral(&params, false, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "SpectralClustering(n_clusters=4, eigen_solver='arpack', n_components=4, \
             random_state=0, n_init=10, gamma=0.5, affinity='poly', eigen_tol=0.0, \
             assign_labels='cluster_qr', degree=3.0, coef0=1.0, n_jobs=1, verbose=False)"
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.for_field("n_neighbors").count(), 1);
    }

    #[test]
    fn test_gmm_full_binding() {
        let params = GaussianMixtureParams {
            n_components: Some(3),
            covariance_type: Some(CovarianceType::Tied),
            tol: Some(0.001),
            reg_covar: Some(0.01),
            max_iter: Some(200),
            n_init: Some(2),
            init_params: Some(MixtureInit::KMeansPlusPlus),
            random_state: Some(5),
            warm_start: Some(true),
            verbose: Some(2),
            verbose_interval: Some(5),
        };
        let mut diagnostics = Diagnostics::new();
        let call = gaussian_mixture(&params, false, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "GaussianMixture(n_components=3, covariance_type='tied', tol=0.001, reg_covar=0.01, \
             max_iter=200, n_init=2, init_params='k-means++', random_state=5, warm_start=True, \
             verbose=2, verbose_interval=5)"
        );
        assert_eq!(call.import_line(), "from sklearn.mixture import GaussianMixture");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_dbscan_p_requires_minkowski() {
        let params = DbscanParams {
            eps: Some(0.5),
            p: Some(2.0),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = dbscan(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["eps"]);
        assert_eq!(diagnostics.for_field("p").count(), 1);

        let params = DbscanParams {
            metric: Some(DistanceMetric::Minkowski),
            ..params
        };
        let mut diagnostics = Diagnostics::new();
        let call = dbscan(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["eps", "metric", "p"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_dbscan_kd_tree_cosine() {
        let params = DbscanParams {
            metric: Some(DistanceMetric::Cosine),
            algorithm: Some(NeighborAlgorithm::KdTree),
            leaf_size: Some(20),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = dbscan(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["metric"]);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.for_field("algorithm").count(), 1);
        assert_eq!(diagnostics.for_field("leaf_size").count(), 1);
    }

    #[test]
    fn test_dbscan_min_samples_from_feature_count() {
        let mut diagnostics = Diagnostics::new();
        let call = dbscan(&DbscanParams::default(), true, &mut diagnostics);
        assert_eq!(call.constructor(), "DBSCAN(min_samples=2 * n_features)");
    }

    #[test]
    fn test_spectral_affinity_scoped_params() {
        let params = SpectralClusteringParams {
            n_clusters: Some(2),
            affinity: Some(Affinity::NearestNeighbors),
            n_neighbors: Some(5),
            gamma: Some(1.0),
            degree: Some(3.0),
            coef0: Some(1.0),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = spectral(&params, false, &mut diagnostics);
        assert_eq!(
            call.params.names(),
            vec!["n_clusters", "affinity", "n_neighbors"]
        );
        assert_eq!(diagnostics.len(), 3);
        assert!(!diagnostics.has_fatal());
    }

    #[test]
    fn test_spectral_poly_keeps_degree_and_coef0() {
        let params = SpectralClusteringParams {
            affinity: Some(Affinity::Poly),
            degree: Some(3.0),
            coef0: Some(1.0),
            n_neighbors: Some(4),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = spectral(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["affinity", "degree", "coef0"]);
        assert_eq!(diagnostics.for_field("n_neighbors").count(), 1);
    }

    #[test]
    fn test_gmm_verbose_interval() {
        let params = GaussianMixtureParams {
            n_components: Some(3),
            covariance_type: Some(CovarianceType::Diag),
            verbose_interval: Some(5),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = gaussian_mixture(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["n_components", "covariance_type"]);
        assert_eq!(diagnostics.len(), 1);

        let params = GaussianMixtureParams {
            verbose: Some(2),
            ..params
        };
        let mut diagnostics = Diagnostics::new();
        let call = gaussian_mixture(&params, false, &mut diagnostics);
        assert!(call.params.is_bound("verbose_interval"));
        assert!(diagnostics.is_empty());
    }
}
