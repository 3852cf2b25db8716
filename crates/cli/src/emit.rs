use anyhow::Result;
use jsplit_chunker::{Chunk, Manifest};
use std::fs;
use std::path::Path;

/// Loader flavor emitted next to the chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Sequential-async `<script>` loader driven by the manifest
    Browser,
    /// Synchronous entry point that requires chunks in manifest order
    Node,
}

impl Target {
    pub const fn entry_name(self) -> &'static str {
        match self {
            Target::Browser => "loader.js",
            Target::Node => "index.js",
        }
    }
}

/// Make each chunk publish its top-level names for the Node target.
///
/// `require` gives every chunk file its own module scope, so later chunks
/// cannot see earlier declarations unless each chunk hands them to
/// `globalThis`. Browser chunks need no footer: classic scripts share the
/// global lexical environment.
pub fn append_export_footers(chunks: &mut [Chunk]) {
    for chunk in chunks {
        if chunk.exports.is_empty() {
            continue;
        }
        let names = chunk.exports.join(", ");
        let content = format!(
            "{}\n;Object.assign(globalThis, {{ {names} }});\n",
            chunk.content
        );
        chunk.rewrite_content(content);
    }
}

/// Write one `<id>.js` per chunk, the manifest, and the target's entry
/// script into `out_dir`, creating it if needed.
pub fn write_artifacts(
    out_dir: &Path,
    chunks: &[Chunk],
    manifest: &Manifest,
    target: Target,
    entry_name: &str,
) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    for (chunk, entry) in chunks.iter().zip(&manifest.chunks) {
        fs::write(out_dir.join(&entry.filename), &chunk.content)?;
        log::debug!("wrote {} ({} bytes)", entry.filename, chunk.size);
    }

    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(out_dir.join("manifest.json"), json)?;

    let entry_script = match target {
        Target::Browser => BROWSER_LOADER.to_string(),
        Target::Node => render_node_entry(manifest),
    };
    fs::write(out_dir.join(entry_name), entry_script)?;

    Ok(())
}

/// Loads every chunk in manifest order, one script at a time.
/// `async = false` keeps execution order even though fetching overlaps.
const BROWSER_LOADER: &str = r#"(function () {
  'use strict';

  function loadScript(src) {
    return new Promise(function (resolve, reject) {
      var script = document.createElement('script');
      script.src = src;
      script.async = false;
      script.onload = resolve;
      script.onerror = function () {
        reject(new Error('failed to load ' + src));
      };
      document.head.appendChild(script);
    });
  }

  fetch('manifest.json')
    .then(function (response) { return response.json(); })
    .then(function (manifest) {
      return manifest.chunks.reduce(function (previous, chunk) {
        return previous.then(function () { return loadScript(chunk.filename); });
      }, Promise.resolve());
    })
    .catch(function (err) {
      console.error('chunk loading failed:', err);
    });
})();
"#;

fn render_node_entry(manifest: &Manifest) -> String {
    let mut out = String::from("'use strict';\n\n");

    for entry in &manifest.chunks {
        out.push_str(&format!("require('./{}');\n", entry.filename));
    }

    let mut names: Vec<&str> = Vec::new();
    for entry in &manifest.chunks {
        for name in &entry.exports {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }

    out.push_str("\nmodule.exports = {\n");
    for name in names {
        out.push_str(&format!("  {name}: globalThis.{name},\n"));
    }
    out.push_str("};\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str, exports: &[&str]) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            size: content.len(),
            exports: exports.iter().map(|s| s.to_string()).collect(),
            dependencies: Vec::new(),
            order: 0,
        }
    }

    #[test]
    fn footer_publishes_exports_and_updates_size() {
        let mut chunks = vec![chunk("chunk_000", "const a = 1;", &["a"])];
        append_export_footers(&mut chunks);

        assert!(chunks[0].content.contains("Object.assign(globalThis, { a })"));
        assert_eq!(chunks[0].size, chunks[0].content.len());
    }

    #[test]
    fn footer_skips_chunks_without_exports() {
        let mut chunks = vec![chunk("chunk_000", "doWork();", &[])];
        append_export_footers(&mut chunks);
        assert_eq!(chunks[0].content, "doWork();");
    }

    #[test]
    fn node_entry_requires_in_manifest_order() {
        let chunks = vec![
            chunk("chunk_000", "function f() {}", &["f"]),
            chunk("chunk_001", "function g() {}", &["g"]),
        ];
        let manifest = Manifest::new(&chunks, Target::Node.entry_name());
        let entry = render_node_entry(&manifest);

        let first = entry.find("chunk_000.js").unwrap();
        let second = entry.find("chunk_001.js").unwrap();
        assert!(first < second);
        assert!(entry.contains("f: globalThis.f"));
        assert!(entry.contains("g: globalThis.g"));
    }
}
