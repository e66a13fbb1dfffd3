use crate::container::{ContainerId, ViewContainer};

/// The visible element view containers are attached to.
///
/// Only tracks which containers are children, in document order; the
/// containers themselves are owned by whoever created them.
#[derive(Debug, Default)]
pub struct HostElement {
  next_id: u64,
  children: Vec<ContainerId>,
}

impl HostElement {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a new, detached container owned by the caller.
  pub fn create_container(&mut self) -> ViewContainer {
    self.next_id += 1;
    ViewContainer::new(ContainerId(self.next_id))
  }

  /// Append a container as the last child. An already attached container is moved.
  pub fn append(&mut self, container: &ViewContainer) {
    self.children.retain(|id| *id != container.id());
    self.children.push(container.id());
  }

  /// Detach a container. Returns false if it was not attached.
  pub fn remove(&mut self, container: &ViewContainer) -> bool {
    let before = self.children.len();
    self.children.retain(|id| *id != container.id());
    self.children.len() != before
  }

  pub fn contains(&self, container: &ViewContainer) -> bool {
    self.children.contains(&container.id())
  }

  pub fn attached_count(&self) -> usize {
    self.children.len()
  }

  pub fn children(&self) -> &[ContainerId] {
    &self.children
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_append_moves_existing_child() {
    let mut host = HostElement::new();
    let a = host.create_container();
    let b = host.create_container();

    host.append(&a);
    host.append(&b);
    host.append(&a);

    assert_eq!(host.children(), &[b.id(), a.id()]);
    assert_eq!(host.attached_count(), 2);
  }

  #[test]
  fn test_remove() {
    let mut host = HostElement::new();
    let a = host.create_container();

    assert!(!host.remove(&a));
    host.append(&a);
    assert!(host.contains(&a));
    assert!(host.remove(&a));
    assert!(!host.contains(&a));
    assert_eq!(host.attached_count(), 0);
  }

  #[test]
  fn test_container_ids_are_unique() {
    let mut host = HostElement::new();
    let a = host.create_container();
    let b = host.create_container();
    assert_ne!(a.id(), b.id());
  }
}
