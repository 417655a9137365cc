#[cfg(test)]
pub mod test {
    use std::path::Path;

    use crate::document::{self, Format, Node};
    use crate::interview::Interview;
    use crate::settings::Settings;

    /// Parse a single node from YAML.
    pub fn node(yaml: &str) -> Node {
        serde_yaml::from_str(yaml).unwrap()
    }

    /// Parse a YAML document into its nodes.
    pub fn nodes(yaml: &str) -> Vec<Node> {
        document::parse(yaml, Format::Yaml, Path::new("test.yaml"))
            .unwrap()
            .nodes
    }

    /// An interview over a YAML document with no home directory.
    pub fn interview(yaml: &str) -> Interview {
        Interview::builder().load_str(yaml, Format::Yaml).unwrap()
    }

    /// An interview over a YAML document starting from `settings`.
    pub fn interview_with(yaml: &str, settings: Settings) -> Interview {
        Interview::builder()
            .settings(settings)
            .load_str(yaml, Format::Yaml)
            .unwrap()
    }

    /// Answer every pending item from `replies`, in order. Returns the
    /// number of items answered.
    pub fn answer_all(interview: &mut Interview, replies: &[&str]) -> usize {
        let mut replies = replies.iter();
        let mut answered = 0;
        while let Some(item) = interview.next().unwrap() {
            let reply = replies.next().expect("ran out of replies");
            interview.answer(&item, reply).unwrap();
            answered += 1;
        }
        answered
    }

    // -- A small interview exercising every kind -------------------------------

    pub const PROVISION: &str = r#"
- kind: notice
  key: intro.seen
  type: bool
  default: true
  title: Provisioning
  text: This interview collects host settings.
- kind: question
  key: hostname
  section: host
  type: str
  required: true
  title: Hostname
  text: Name of the host?
- kind: question
  key: os
  section: host
  values: [ubuntu, centos, arch]
  default: ubuntu
  title: Operating system
  text: Which distribution?
- kind: branch
  match_key: host.os
  match_values: [ubuntu, centos]
  interview:
    - kind: set
      key: host.family
      value: linux-server
      title: Family
      text: Distribution family.
- kind: set
  key: disks.count
  type: int
  value: 0
  title: Disk count
  text: Disks configured so far.
- kind: question
  key: disks.size
  type: int
  range: 1-100
  parameterize: disks.count
  title: Disk size
  text: Size in GiB?
- kind: question
  key: disks.more
  type: bool
  default: no
  title: More disks
  text: Add another disk?
- kind: branch
  match_key: disks.more
  match_values: [true]
  interview:
    - kind: update
      key: disks.count
    - kind: reset
      reset_keys: [disks.more]
"#;
}
