use std::path::PathBuf;

use taskpipe::config::SassStyle;
use taskpipe::pipeline::{FileTransform, Merge, SourceMapChain, StageOutput, VirtualFile};
use taskpipe::plugins::{
    Autoprefix, Concat, ExternalCommand, Filter, MinifyCss, Rename, Sass, SourcemapInit,
    SourcemapWrite, parse_targets,
};

fn one(output: StageOutput) -> VirtualFile {
    match output {
        StageOutput::One(file) => file,
        other => panic!("expected one file, got {other:?}"),
    }
}

fn text(file: &VirtualFile) -> &str {
    std::str::from_utf8(&file.contents).unwrap()
}

#[test]
fn rename_follows_gulp_rename_rules() {
    let suffix = Rename {
        suffix: Some(".min".to_string()),
        ..Rename::default()
    };
    assert_eq!(suffix.apply("style.css"), "style.min.css");
    assert_eq!(suffix.apply("README"), "README.min");
    assert_eq!(suffix.apply(".hidden"), ".hidden.min");

    let full = Rename {
        basename: Some("custom".to_string()),
        prefix: Some("x-".to_string()),
        suffix: Some(".min".to_string()),
        extname: Some(".mjs".to_string()),
    };
    assert_eq!(full.apply("app.js"), "x-custom.min.mjs");
}

#[test]
fn rename_keeps_the_directory() {
    let rename = Rename {
        suffix: Some(".min".to_string()),
        ..Rename::default()
    };
    let out = one(rename.transform(VirtualFile::new("lib/app.js", "x")).unwrap());
    assert_eq!(out.path, PathBuf::from("lib/app.min.js"));
    assert_eq!(out.original, PathBuf::from("lib/app.js"));
}

#[test]
fn filter_matches_partials_in_any_directory() {
    let filter = Filter::new("(^|/)_").unwrap();
    assert!(matches!(
        filter.transform(VirtualFile::new("parts/_grid.scss", "")).unwrap(),
        StageOutput::Drop
    ));
    assert!(matches!(
        filter.transform(VirtualFile::new("style_2.scss", "")).unwrap(),
        StageOutput::One(_)
    ));
    assert!(Filter::new("(").is_err());
}

#[test]
fn concat_joins_with_separator_and_unions_source_maps() {
    let mut a = VirtualFile::new("a.js", "1");
    a.source_map = Some(SourceMapChain::start(&a.original));
    let b = VirtualFile::new("b.js", "2");

    let merged = Concat::new("custom.js", None).merge(vec![a, b]).unwrap();

    assert_eq!(merged.path, PathBuf::from("custom.js"));
    assert_eq!(text(&merged), "1\n2");
    let chain = merged.source_map.expect("chain kept");
    assert_eq!(chain.sources, vec!["a.js"]);
    assert_eq!(chain.stages.last().map(String::as_str), Some("concat"));
}

#[test]
fn sourcemap_write_emits_a_v3_map_and_a_url_comment() {
    let file = one(SourcemapInit.transform(VirtualFile::new("css/style.css", "a{}")).unwrap());
    let mut file = file;
    file.record_stage("sass");

    let writer = SourcemapWrite {
        dir: Some(PathBuf::from("maps")),
    };
    let StageOutput::Many(files) = writer.transform(file).unwrap() else {
        panic!("expected a split");
    };

    assert_eq!(files[0].path, PathBuf::from("css/style.css"));
    assert!(text(&files[0]).ends_with("/*# sourceMappingURL=maps/style.css.map */\n"));
    assert!(files[0].source_map.is_none());

    assert_eq!(files[1].path, PathBuf::from("css/maps/style.css.map"));
    let map: serde_json::Value = serde_json::from_slice(&files[1].contents).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "style.css");
    assert_eq!(map["sources"], serde_json::json!(["css/style.css"]));
    assert_eq!(map["x_taskpipe_stages"], serde_json::json!(["sass"]));
}

#[test]
fn sourcemap_write_ignores_untracked_files_and_uses_line_comments_for_js() {
    let untracked = one(SourcemapWrite::default().transform(VirtualFile::new("a.js", "x")).unwrap());
    assert_eq!(text(&untracked), "x");

    let tracked = one(SourcemapInit.transform(VirtualFile::new("a.js", "x")).unwrap());
    let StageOutput::Many(files) = SourcemapWrite::default().transform(tracked).unwrap() else {
        panic!("expected a split");
    };
    assert_eq!(text(&files[0]), "x\n//# sourceMappingURL=a.js.map\n");
}

#[test]
fn sass_compiles_scss_and_changes_extension() {
    let sass = Sass {
        style: SassStyle::Expanded,
    };
    let out = one(
        sass.transform(VirtualFile::new(
            "style.scss",
            "$accent: red;\n.button { .icon { color: $accent; } }\n",
        ))
        .unwrap(),
    );

    assert_eq!(out.path, PathBuf::from("style.css"));
    let css = text(&out);
    assert!(css.contains(".button .icon"), "{css}");
    assert!(css.contains("color: red"), "{css}");
}

#[test]
fn sass_errors_surface_and_other_files_pass_through() {
    let sass = Sass::default();
    assert!(sass.transform(VirtualFile::new("bad.scss", ".a { color: $missing; }")).is_err());

    let js = one(sass.transform(VirtualFile::new("app.js", "$x")).unwrap());
    assert_eq!(text(&js), "$x");
}

#[test]
fn minify_css_shrinks_css_and_skips_maps() {
    let minify = MinifyCss::default();
    let out = one(
        minify
            .transform(VirtualFile::new("style.css", ".a {\n  color: #ff0000;\n}\n"))
            .unwrap(),
    );
    assert_eq!(text(&out), ".a{color:red}");

    let map = one(minify.transform(VirtualFile::new("style.css.map", "{ }")).unwrap());
    assert_eq!(text(&map), "{ }");
}

#[test]
fn autoprefix_adds_prefixes_for_old_browsers() {
    let autoprefix = Autoprefix {
        targets: parse_targets(&["safari 5".to_string()]).unwrap(),
    };
    let out = one(
        autoprefix
            .transform(VirtualFile::new("style.css", ".a { user-select: none; }"))
            .unwrap(),
    );
    assert!(text(&out).contains("-webkit-user-select"), "{}", text(&out));
}

#[test]
fn browser_targets_parse_and_keep_the_oldest_version() {
    let targets = parse_targets(&[
        "ie 9".to_string(),
        "ie 8".to_string(),
        "opera 12.1".to_string(),
    ])
    .unwrap()
    .unwrap();
    assert_eq!(targets.ie, Some(8 << 16));
    assert_eq!(targets.opera, Some(12 << 16 | 1 << 8));

    assert!(parse_targets(&[]).unwrap().is_none());
    assert!(parse_targets(&["netscape 4".to_string()]).is_err());
    assert!(parse_targets(&["last 2 versions".to_string()]).is_err());
}

#[cfg(unix)]
#[test]
fn external_command_pipes_contents_through_stdin_and_stdout() {
    let upper = ExternalCommand::new("tr a-z A-Z", &[]).unwrap();
    let out = one(upper.transform(VirtualFile::new("a.txt", "hello")).unwrap());
    assert_eq!(text(&out), "HELLO");
}

#[cfg(unix)]
#[test]
fn js_minifier_only_touches_js_and_reports_failures() {
    let failing = ExternalCommand::js_minifier("false", &[]).unwrap();
    let css = one(failing.transform(VirtualFile::new("a.css", "a{}")).unwrap());
    assert_eq!(text(&css), "a{}");

    let err = failing.transform(VirtualFile::new("a.js", "var a;")).unwrap_err();
    assert!(format!("{err:#}").contains("`false` exited"), "{err:#}");
}

#[test]
fn external_command_needs_a_program() {
    assert!(ExternalCommand::new("   ", &[]).is_err());
}
