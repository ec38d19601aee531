//! CI environment detection.
//!
//! Providers are tried in a fixed order against a snapshot of the process
//! environment; the first one whose marker variables are present wins and
//! maps its variables onto a [`CiEnvironment`].

use std::collections::HashMap;

use serde::Serialize;

/// Environment snapshot used for detection.
pub type Env = HashMap<String, String>;

/// Captures the current process environment.
pub fn process_env() -> Env {
    std::env::vars().collect()
}

/// Build metadata exposed by a CI provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CiEnvironment {
    pub service: Option<String>,
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub build: Option<String>,
    pub build_id: Option<String>,
    pub pull_request: Option<String>,
    /// `owner/repo`.
    pub slug: Option<String>,
    pub root_dir: Option<String>,
    pub os_name: Option<String>,
    pub account_name: Option<String>,
}

/// One entry of the provider table.
pub struct Provider {
    pub name: &'static str,
    pub detect: fn(&Env) -> Option<CiEnvironment>,
}

/// Providers in detection order.
pub static PROVIDERS: &[Provider] = &[
    Provider {
        name: "github",
        detect: github,
    },
    Provider {
        name: "jenkins",
        detect: jenkins,
    },
    Provider {
        name: "travis-ci",
        detect: travis,
    },
    Provider {
        name: "docker",
        detect: docker,
    },
    Provider {
        name: "codeship",
        detect: codeship,
    },
    Provider {
        name: "codefresh",
        detect: codefresh,
    },
    Provider {
        name: "teamcity",
        detect: teamcity,
    },
    Provider {
        name: "circle-ci",
        detect: circle,
    },
    Provider {
        name: "buddybuild",
        detect: buddybuild,
    },
    Provider {
        name: "bitrise",
        detect: bitrise,
    },
    Provider {
        name: "semaphore",
        detect: semaphore,
    },
    Provider {
        name: "buildkite",
        detect: buildkite,
    },
    Provider {
        name: "drone.io",
        detect: drone,
    },
    Provider {
        name: "heroku",
        detect: heroku,
    },
    Provider {
        name: "appveyor",
        detect: appveyor,
    },
    Provider {
        name: "wercker",
        detect: wercker,
    },
    Provider {
        name: "magnum",
        detect: magnum,
    },
    Provider {
        name: "shippable",
        detect: shippable,
    },
    Provider {
        name: "solano",
        detect: solano,
    },
    Provider {
        name: "greenhouse",
        detect: greenhouse,
    },
    Provider {
        name: "gitlab",
        detect: gitlab,
    },
    Provider {
        name: "azure_pipelines",
        detect: azure,
    },
];

/// Returns the environment of the first matching provider.
pub fn detect(env: &Env) -> Option<CiEnvironment> {
    for provider in PROVIDERS {
        if let Some(mut ci) = (provider.detect)(env) {
            tracing::info!("{} detected", provider.name);
            ci.service = Some(provider.name.to_string());
            return Some(ci);
        }
    }

    tracing::info!("No CI detected");
    None
}

fn get(env: &Env, key: &str) -> Option<String> {
    env.get(key).cloned()
}

fn has(env: &Env, key: &str) -> bool {
    env.contains_key(key)
}

fn is(env: &Env, key: &str, value: &str) -> bool {
    env.get(key).is_some_and(|v| v == value)
}

fn first(env: &Env, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| get(env, key))
}

fn github(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "GITHUB_ACTIONS") {
        return None;
    }

    Some(CiEnvironment {
        branch: env
            .get("GITHUB_REF")
            .and_then(|r| r.rsplit('/').next())
            .map(str::to_string),
        commit: get(env, "GITHUB_SHA"),
        build: get(env, "GITHUB_RUN_ID"),
        slug: get(env, "GITHUB_REPOSITORY"),
        ..Default::default()
    })
}

fn jenkins(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "JENKINS_URL") {
        return None;
    }

    Some(CiEnvironment {
        branch: first(env, &["ghprbSourceBranch", "GIT_BRANCH", "BRANCH_NAME"]),
        commit: first(env, &["ghprbActualCommit", "GIT_COMMIT"]),
        pull_request: first(env, &["ghprbPullId", "CHANGE_ID"]),
        root_dir: get(env, "WORKSPACE"),
        build: get(env, "BUILD_NUMBER"),
        ..Default::default()
    })
}

fn travis(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "true") && is(env, "TRAVIS", "true") && !is(env, "SHIPPABLE", "true")) {
        return None;
    }

    // Tag builds report the tag as the branch.
    let branch = get(env, "TRAVIS_BRANCH").filter(|b| env.get("TRAVIS_TAG") != Some(b));

    Some(CiEnvironment {
        branch,
        commit: get(env, "TRAVIS_COMMIT"),
        build: get(env, "TRAVIS_JOB_NUMBER"),
        pull_request: get(env, "TRAVIS_PULL_REQUEST"),
        build_id: get(env, "TRAVIS_JOB_ID"),
        slug: get(env, "TRAVIS_REPO_SLUG"),
        root_dir: get(env, "TRAVIS_BUILD_DIR"),
        os_name: get(env, "TRAVIS_OS_NAME"),
        ..Default::default()
    })
}

fn docker(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "DOCKER_REPO") {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "SOURCE_BRANCH"),
        commit: get(env, "SOURCE_COMMIT"),
        slug: get(env, "DOCKER_REPO"),
        ..Default::default()
    })
}

fn codeship(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "true") && is(env, "CI_NAME", "codeship")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "CI_BRANCH"),
        build: get(env, "CI_BUILD_NUMBER"),
        commit: get(env, "CI_COMMIT_ID"),
        ..Default::default()
    })
}

fn codefresh(env: &Env) -> Option<CiEnvironment> {
    if !(has(env, "CF_BUILD_URL") && has(env, "CF_BUILD_ID")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "CF_BRANCH"),
        build: get(env, "CF_BUILD_ID"),
        commit: get(env, "CF_REVISION"),
        ..Default::default()
    })
}

fn teamcity(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "TEAMCITY_VERSION") {
        return None;
    }

    if !has(env, "TEAMCITY_BUILD_ID") {
        tracing::warn!(
            "TeamCity does not export build parameters as environment variables. \
             Add env.TEAMCITY_BUILD_BRANCH, env.TEAMCITY_BUILD_ID and \
             env.TEAMCITY_BUILD_COMMIT to the build configuration"
        );
    }

    Some(CiEnvironment {
        branch: get(env, "TEAMCITY_BUILD_BRANCH"),
        build: get(env, "TEAMCITY_BUILD_ID"),
        commit: first(env, &["TEAMCITY_BUILD_COMMIT", "BUILD_VCS_NUMBER"]),
        ..Default::default()
    })
}

fn circle(env: &Env) -> Option<CiEnvironment> {
    if !(has(env, "CI") && has(env, "CIRCLECI")) {
        return None;
    }

    let slug = match (
        env.get("CIRCLE_PROJECT_USERNAME"),
        env.get("CIRCLE_PROJECT_REPONAME"),
    ) {
        (Some(user), Some(repo)) => Some(format!("{}/{}", user, repo)),
        _ => None,
    };

    Some(CiEnvironment {
        branch: get(env, "CIRCLE_BRANCH"),
        build_id: get(env, "CIRCLE_BUILD_NUM"),
        pull_request: get(env, "CIRCLE_PR_NUMBER"),
        commit: get(env, "CIRCLE_SHA1"),
        root_dir: env
            .get("CIRCLE_WORKING_DIRECTORY")
            .map(|dir| shellexpand::tilde(dir).into_owned()),
        slug,
        ..Default::default()
    })
}

fn buddybuild(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "BUDDYBUILD_BRANCH") {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "BUDDYBUILD_BRANCH"),
        build: get(env, "BUDDYBUILD_BUILD_NUMBER"),
        ..Default::default()
    })
}

fn bitrise(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "true") && is(env, "BITRISE_IO", "true")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "BITRISE_GIT_BRANCH"),
        build: get(env, "BITRISE_BUILD_NUMBER"),
        pull_request: get(env, "BITRISE_PULL_REQUEST"),
        commit: get(env, "GIT_CLONE_COMMIT_HASH"),
        ..Default::default()
    })
}

fn semaphore(env: &Env) -> Option<CiEnvironment> {
    if !(has(env, "CI") && has(env, "SEMAPHORE")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "BRANCH_NAME"),
        build: get(env, "SEMAPHORE_BUILD_NUMBER"),
        build_id: get(env, "SEMAPHORE_CURRENT_THREAD"),
        pull_request: get(env, "PULL_REQUEST_NUMBER"),
        slug: get(env, "SEMAPHORE_REPO_SLUG"),
        commit: get(env, "REVISION"),
        ..Default::default()
    })
}

fn buildkite(env: &Env) -> Option<CiEnvironment> {
    let enabled = env.get("BUILDKITE").is_some_and(|v| !v.is_empty());
    if !(is(env, "CI", "true") && enabled) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "BUILDKITE_BRANCH"),
        build: get(env, "BUILDKITE_BUILD_NUMBER"),
        build_id: get(env, "BUILDKITE_JOB_ID"),
        slug: get(env, "BUILDKITE_PROJECT_SLUG"),
        commit: get(env, "BUILDKITE_COMMIT"),
        pull_request: get(env, "BUILDKITE_PULL_REQUEST").filter(|pr| pr != "false"),
        ..Default::default()
    })
}

fn drone(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "drone") || is(env, "DRONE", "true")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "DRONE_BRANCH"),
        build_id: get(env, "DRONE_BUILD_NUMBER"),
        pull_request: get(env, "DRONE_PULL_REQUEST"),
        ..Default::default()
    })
}

fn heroku(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "HEROKU_TEST_RUN_BRANCH") {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "HEROKU_TEST_RUN_BRANCH"),
        build_id: get(env, "HEROKU_TEST_RUN_ID"),
        ..Default::default()
    })
}

fn appveyor(env: &Env) -> Option<CiEnvironment> {
    let truthy = |key: &str| env.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"));
    if !(truthy("CI") && truthy("APPVEYOR")) {
        return None;
    }

    Some(CiEnvironment {
        branch: first(
            env,
            &["APPVEYOR_PULL_REQUEST_HEAD_REPO_BRANCH", "APPVEYOR_REPO_BRANCH"],
        ),
        build_id: get(env, "APPVEYOR_BUILD_ID"),
        pull_request: get(env, "APPVEYOR_PULL_REQUEST_NUMBER"),
        commit: get(env, "APPVEYOR_REPO_COMMIT"),
        slug: get(env, "APPVEYOR_REPO_NAME"),
        account_name: get(env, "APPVEYOR_ACCOUNT_NAME"),
        root_dir: get(env, "APPVEYOR_BUILD_FOLDER"),
        ..Default::default()
    })
}

fn wercker(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "true") && has(env, "WERCKER_GIT_BRANCH")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "WERCKER_GIT_BRANCH"),
        build: get(env, "WERCKER_MAIN_PIPELINE_STARTED"),
        commit: get(env, "WERCKER_GIT_COMMIT"),
        ..Default::default()
    })
}

fn magnum(env: &Env) -> Option<CiEnvironment> {
    if !(is(env, "CI", "true") && is(env, "MAGNUM", "true")) {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "CI_BRANCH"),
        build: get(env, "CI_BUILD_NUMBER"),
        commit: get(env, "CI_COMMIT"),
        ..Default::default()
    })
}

fn shippable(env: &Env) -> Option<CiEnvironment> {
    if !is(env, "SHIPPABLE", "true") {
        return None;
    }

    Some(CiEnvironment {
        build: get(env, "BUILD_NUMBER"),
        pull_request: get(env, "PULL_REQUEST"),
        slug: get(env, "REPO_FULL_NAME"),
        commit: get(env, "COMMIT"),
        ..Default::default()
    })
}

fn solano(env: &Env) -> Option<CiEnvironment> {
    if !is(env, "TDDIUM", "true") {
        return None;
    }

    Some(CiEnvironment {
        commit: get(env, "TDDIUM_CURRENT_COMMIT"),
        branch: get(env, "TDDIUM_CURRENT_BRANCH"),
        build: get(env, "TDDIUM_TID"),
        pull_request: get(env, "TDDIUM_PR_ID"),
        ..Default::default()
    })
}

fn greenhouse(env: &Env) -> Option<CiEnvironment> {
    if !is(env, "GREENHOUSE", "true") {
        return None;
    }

    Some(CiEnvironment {
        branch: get(env, "GREENHOUSE_BRANCH"),
        build: get(env, "GREENHOUSE_BUILD_NUMBER"),
        pull_request: get(env, "GREENHOUSE_PULL_REQUEST"),
        commit: get(env, "GREENHOUSE_COMMIT"),
        ..Default::default()
    })
}

fn gitlab(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "GITLAB_CI") {
        return None;
    }

    let build = match (get(env, "CI_BUILD_ID"), get(env, "CI_JOB_ID")) {
        (Some(build), Some(job)) => Some(format!("{}:{}", build, job)),
        (build, job) => build.or(job),
    };

    Some(CiEnvironment {
        build,
        commit: get(env, "CI_COMMIT_SHA"),
        ..Default::default()
    })
}

fn azure(env: &Env) -> Option<CiEnvironment> {
    if !has(env, "SYSTEM_TEAMFOUNDATIONSERVERURI") {
        return None;
    }

    Some(CiEnvironment {
        commit: get(env, "BUILD_SOURCEVERSION"),
        build: get(env, "BUILD_BUILDNUMBER"),
        pull_request: first(env, &["PULL_REQUEST_NUMBER", "PULL_REQUEST_ID"]),
        branch: get(env, "BUILD_SOURCEBRANCHNAME"),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Env {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_ci() {
        assert_eq!(detect(&env(&[("HOME", "/root")])), None);
    }

    #[test]
    fn test_provider_names_are_unique() {
        let mut names: Vec<_> = PROVIDERS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PROVIDERS.len());
        assert_eq!(PROVIDERS.len(), 22);
    }

    #[test]
    fn test_github() {
        let ci = detect(&env(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_REPOSITORY", "acme/widgets"),
        ]))
        .unwrap();

        assert_eq!(ci.service.as_deref(), Some("github"));
        assert_eq!(ci.branch.as_deref(), Some("main"));
        assert_eq!(ci.commit.as_deref(), Some("abc123"));
        assert_eq!(ci.build.as_deref(), Some("42"));
        assert_eq!(ci.slug.as_deref(), Some("acme/widgets"));
    }

    #[test]
    fn test_github_wins_over_later_providers() {
        let ci = detect(&env(&[
            ("GITHUB_ACTIONS", "true"),
            ("JENKINS_URL", "http://jenkins"),
            ("GITLAB_CI", "true"),
        ]))
        .unwrap();
        assert_eq!(ci.service.as_deref(), Some("github"));
    }

    #[test]
    fn test_jenkins_prefers_pull_request_builder() {
        let ci = detect(&env(&[
            ("JENKINS_URL", "http://jenkins"),
            ("ghprbSourceBranch", "feature"),
            ("GIT_BRANCH", "origin/feature"),
            ("GIT_COMMIT", "def456"),
            ("CHANGE_ID", "7"),
            ("WORKSPACE", "/var/jenkins/ws"),
            ("BUILD_NUMBER", "9"),
        ]))
        .unwrap();

        assert_eq!(ci.service.as_deref(), Some("jenkins"));
        assert_eq!(ci.branch.as_deref(), Some("feature"));
        assert_eq!(ci.commit.as_deref(), Some("def456"));
        assert_eq!(ci.pull_request.as_deref(), Some("7"));
        assert_eq!(ci.root_dir.as_deref(), Some("/var/jenkins/ws"));
        assert_eq!(ci.build.as_deref(), Some("9"));
    }

    #[test]
    fn test_travis() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("TRAVIS", "true"),
            ("TRAVIS_BRANCH", "master"),
            ("TRAVIS_COMMIT", "1111"),
            ("TRAVIS_JOB_ID", "555"),
            ("TRAVIS_JOB_NUMBER", "12.3"),
            ("TRAVIS_REPO_SLUG", "acme/widgets"),
            ("TRAVIS_BUILD_DIR", "/home/travis/build/acme/widgets"),
            ("TRAVIS_OS_NAME", "linux"),
            ("TRAVIS_PULL_REQUEST", "false"),
        ]))
        .unwrap();

        assert_eq!(ci.service.as_deref(), Some("travis-ci"));
        assert_eq!(ci.branch.as_deref(), Some("master"));
        assert_eq!(ci.build_id.as_deref(), Some("555"));
        assert_eq!(ci.build.as_deref(), Some("12.3"));
        assert_eq!(ci.os_name.as_deref(), Some("linux"));
        assert_eq!(ci.root_dir.as_deref(), Some("/home/travis/build/acme/widgets"));
    }

    #[test]
    fn test_travis_tag_build_has_no_branch() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("TRAVIS", "true"),
            ("TRAVIS_BRANCH", "v1.0"),
            ("TRAVIS_TAG", "v1.0"),
        ]))
        .unwrap();
        assert_eq!(ci.branch, None);
    }

    #[test]
    fn test_shippable_is_not_travis() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("TRAVIS", "true"),
            ("SHIPPABLE", "true"),
            ("REPO_FULL_NAME", "acme/widgets"),
        ]))
        .unwrap();
        assert_eq!(ci.service.as_deref(), Some("shippable"));
        assert_eq!(ci.slug.as_deref(), Some("acme/widgets"));
    }

    #[test]
    fn test_circle_builds_slug() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("CIRCLECI", "true"),
            ("CIRCLE_BRANCH", "main"),
            ("CIRCLE_BUILD_NUM", "77"),
            ("CIRCLE_SHA1", "cafe"),
            ("CIRCLE_PROJECT_USERNAME", "acme"),
            ("CIRCLE_PROJECT_REPONAME", "widgets"),
            ("CIRCLE_WORKING_DIRECTORY", "/home/circleci/project"),
        ]))
        .unwrap();

        assert_eq!(ci.service.as_deref(), Some("circle-ci"));
        assert_eq!(ci.slug.as_deref(), Some("acme/widgets"));
        assert_eq!(ci.build_id.as_deref(), Some("77"));
        assert_eq!(ci.root_dir.as_deref(), Some("/home/circleci/project"));
    }

    #[test]
    fn test_circle_expands_tilde() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("CIRCLECI", "true"),
            ("CIRCLE_WORKING_DIRECTORY", "~/project"),
        ]))
        .unwrap();

        assert!(ci.root_dir.unwrap().ends_with("/project"));
    }

    #[test]
    fn test_buildkite_ignores_false_pull_request() {
        let ci = detect(&env(&[
            ("CI", "true"),
            ("BUILDKITE", "true"),
            ("BUILDKITE_PULL_REQUEST", "false"),
            ("BUILDKITE_JOB_ID", "j-1"),
        ]))
        .unwrap();
        assert_eq!(ci.service.as_deref(), Some("buildkite"));
        assert_eq!(ci.pull_request, None);
        assert_eq!(ci.build_id.as_deref(), Some("j-1"));
    }

    #[test]
    fn test_drone_by_ci_value() {
        let ci = detect(&env(&[("CI", "drone"), ("DRONE_BRANCH", "dev")])).unwrap();
        assert_eq!(ci.service.as_deref(), Some("drone.io"));
        assert_eq!(ci.branch.as_deref(), Some("dev"));
    }

    #[test]
    fn test_appveyor_case_insensitive() {
        for value in ["True", "true"] {
            let ci = detect(&env(&[
                ("CI", value),
                ("APPVEYOR", value),
                ("APPVEYOR_REPO_BRANCH", "master"),
                ("APPVEYOR_PULL_REQUEST_HEAD_REPO_BRANCH", "topic"),
                ("APPVEYOR_ACCOUNT_NAME", "acme"),
                ("APPVEYOR_BUILD_ID", "31"),
            ]))
            .unwrap();
            assert_eq!(ci.service.as_deref(), Some("appveyor"));
            assert_eq!(ci.branch.as_deref(), Some("topic"));
            assert_eq!(ci.account_name.as_deref(), Some("acme"));
            assert_eq!(ci.build_id.as_deref(), Some("31"));
        }
    }

    #[test]
    fn test_greenhouse_reads_variables() {
        let ci = detect(&env(&[
            ("GREENHOUSE", "true"),
            ("GREENHOUSE_BRANCH", "main"),
            ("GREENHOUSE_COMMIT", "f00d"),
        ]))
        .unwrap();
        assert_eq!(ci.branch.as_deref(), Some("main"));
        assert_eq!(ci.commit.as_deref(), Some("f00d"));
    }

    #[test]
    fn test_gitlab_joins_build_and_job() {
        let ci = detect(&env(&[
            ("GITLAB_CI", "true"),
            ("CI_BUILD_ID", "10"),
            ("CI_JOB_ID", "20"),
        ]))
        .unwrap();
        assert_eq!(ci.build.as_deref(), Some("10:20"));

        let ci = detect(&env(&[("GITLAB_CI", "true"), ("CI_JOB_ID", "20")])).unwrap();
        assert_eq!(ci.build.as_deref(), Some("20"));
    }

    #[test]
    fn test_azure_pull_request_fallback() {
        let ci = detect(&env(&[
            ("SYSTEM_TEAMFOUNDATIONSERVERURI", "https://dev.azure.com/acme"),
            ("PULL_REQUEST_ID", "3"),
        ]))
        .unwrap();
        assert_eq!(ci.service.as_deref(), Some("azure_pipelines"));
        assert_eq!(ci.pull_request.as_deref(), Some("3"));
    }

    #[test]
    fn test_teamcity_commit_fallback() {
        let ci = detect(&env(&[
            ("TEAMCITY_VERSION", "2023.1"),
            ("BUILD_VCS_NUMBER", "beef"),
        ]))
        .unwrap();
        assert_eq!(ci.service.as_deref(), Some("teamcity"));
        assert_eq!(ci.commit.as_deref(), Some("beef"));
    }
}
