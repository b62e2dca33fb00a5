//! Client-side state of a blog's comment thread.
//!
//! Readers see a flat list where each comment is indented by its depth and a
//! comment's replies, once loaded, follow it directly. The list is derived
//! from an explicit tree of the loaded comments, which is what every
//! mutation works on.

use std::collections::HashMap;

use crate::blog::{comment::CommentView, models::blog::BlogActivity};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ThreadError {
    #[error("comment {0} is not loaded in this thread")]
    UnknownComment(i32),
}

#[derive(Debug, Clone)]
pub struct ThreadNode {
    pub comment: CommentView,
    /// Whether the replies of this comment are shown right after it.
    pub is_reply_loaded: bool,
    /// Replies currently shown, newest first.
    loaded_replies: Vec<i32>,
}

/// One row of the flattened thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadEntry<'a> {
    pub comment: &'a CommentView,
    pub depth: i32,
    pub is_reply_loaded: bool,
}

#[derive(Debug, Default)]
pub struct CommentThread {
    nodes: HashMap<i32, ThreadNode>,
    roots: Vec<i32>,
    activity: BlogActivity,
}

impl CommentThread {
    pub fn new(activity: BlogActivity) -> Self {
        CommentThread {
            activity,
            ..Default::default()
        }
    }

    pub fn activity(&self) -> BlogActivity {
        self.activity
    }

    pub fn get(&self, id: i32) -> Option<&ThreadNode> {
        self.nodes.get(&id)
    }

    /// Number of comments currently shown.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, id: i32) -> Result<&mut ThreadNode, ThreadError> {
        self.nodes
            .get_mut(&id)
            .ok_or(ThreadError::UnknownComment(id))
    }

    fn insert_node(&mut self, mut comment: CommentView, depth: i32) {
        comment.depth = depth;
        self.nodes.insert(
            comment.id,
            ThreadNode {
                comment,
                is_reply_loaded: false,
                loaded_replies: vec![],
            },
        );
    }

    /// Appends the next page of top-level comments. Comments already shown
    /// and replies are ignored. Returns how many were added.
    pub fn push_comments(&mut self, comments: Vec<CommentView>) -> usize {
        let mut added = 0;
        for comment in comments {
            if comment.parent_id.is_some() || self.nodes.contains_key(&comment.id) {
                continue;
            }
            self.roots.push(comment.id);
            self.insert_node(comment, 0);
            added += 1;
        }
        added
    }

    pub fn has_more_comments(&self) -> bool {
        (self.roots.len() as i64) < self.activity.total_parent_comments
    }

    /// Shows a comment the reader just posted at the top of the thread.
    pub fn insert_comment(&mut self, comment: CommentView) {
        if self.nodes.contains_key(&comment.id) {
            return;
        }
        self.roots.insert(0, comment.id);
        self.insert_node(comment, 0);
        self.activity.total_comments += 1;
        self.activity.total_parent_comments += 1;
    }

    /// Shows a reply the reader just posted as the first reply of its parent.
    pub fn insert_reply(&mut self, parent_id: i32, reply: CommentView) -> Result<(), ThreadError> {
        if self.nodes.contains_key(&reply.id) {
            return Ok(());
        }

        let parent = self.node_mut(parent_id)?;
        let depth = parent.comment.depth + 1;

        if !parent.comment.children.contains(&reply.id) {
            parent.comment.children.push(reply.id);
        }
        if !parent.loaded_replies.contains(&reply.id) {
            parent.loaded_replies.insert(0, reply.id);
        }
        parent.is_reply_loaded = true;

        self.insert_node(reply, depth);
        self.activity.total_comments += 1;
        Ok(())
    }

    /// Shows a page of replies fetched with `skip`. The `i`-th reply lands at
    /// position `skip + i` among the parent's shown replies, which in the
    /// flattened thread is `parent_index + 1 + skip + i` while the earlier
    /// replies are collapsed.
    pub fn load_replies(
        &mut self,
        parent_id: i32,
        skip: usize,
        replies: Vec<CommentView>,
    ) -> Result<usize, ThreadError> {
        let parent = self.node_mut(parent_id)?;
        let depth = parent.comment.depth + 1;
        parent.is_reply_loaded = true;

        let mut added = 0;
        for reply in replies {
            if self.nodes.contains_key(&reply.id) {
                continue;
            }

            let parent = self.node_mut(parent_id)?;
            let at = (skip + added).min(parent.loaded_replies.len());
            parent.loaded_replies.insert(at, reply.id);

            self.insert_node(reply, depth);
            added += 1;
        }

        Ok(added)
    }

    pub fn loaded_reply_count(&self, parent_id: i32) -> usize {
        self.nodes
            .get(&parent_id)
            .map_or(0, |n| n.loaded_replies.len())
    }

    /// Whether a "load more replies" action applies to this comment.
    pub fn has_more_replies(&self, parent_id: i32) -> bool {
        self.nodes.get(&parent_id).is_some_and(|n| {
            n.is_reply_loaded && n.loaded_replies.len() < n.comment.children.len()
        })
    }

    /// Hides the replies of a comment. Nothing is deleted on the server.
    pub fn collapse_replies(&mut self, parent_id: i32) -> Result<(), ThreadError> {
        let parent = self.node_mut(parent_id)?;
        parent.is_reply_loaded = false;
        let hidden = std::mem::take(&mut parent.loaded_replies);

        for id in hidden {
            self.drop_subtree(id);
        }
        Ok(())
    }

    /// Removes a comment the server has deleted, along with its shown
    /// replies. `removed` is the number of comments the server deleted.
    pub fn remove(&mut self, comment_id: i32, removed: u64) -> Result<(), ThreadError> {
        let parent_id = self
            .nodes
            .get(&comment_id)
            .ok_or(ThreadError::UnknownComment(comment_id))?
            .comment
            .parent_id;

        self.drop_subtree(comment_id);

        match parent_id.and_then(|id| self.nodes.get_mut(&id)) {
            Some(parent) => {
                parent.comment.children.retain(|id| *id != comment_id);
                parent.loaded_replies.retain(|id| *id != comment_id);
                if parent.comment.children.is_empty() {
                    parent.is_reply_loaded = false;
                }
            }
            None => {
                if self.roots.contains(&comment_id) {
                    self.roots.retain(|id| *id != comment_id);
                    self.activity.total_parent_comments =
                        (self.activity.total_parent_comments - 1).max(0);
                }
            }
        }

        self.activity.total_comments = (self.activity.total_comments - removed as i64).max(0);
        Ok(())
    }

    fn drop_subtree(&mut self, id: i32) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.loaded_replies);
            }
        }
    }

    /// The thread as it is displayed: depth-first, replies after their parent.
    pub fn entries(&self) -> Vec<ThreadEntry<'_>> {
        let mut entries = Vec::with_capacity(self.nodes.len());
        let mut pending: Vec<i32> = self.roots.iter().rev().copied().collect();

        while let Some(id) = pending.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };

            entries.push(ThreadEntry {
                comment: &node.comment,
                depth: node.comment.depth,
                is_reply_loaded: node.is_reply_loaded,
            });

            pending.extend(node.loaded_replies.iter().rev());
        }

        entries
    }
}

/// Index of the entry that `entries[index]` replies to, found by walking back
/// to the first shallower entry. `None` for top-level entries.
pub fn parent_position(entries: &[ThreadEntry<'_>], index: usize) -> Option<usize> {
    let depth = entries.get(index)?.depth;

    (0..index).rev().find(|&i| entries[i].depth < depth)
}

/// Index one past the last reply shown under `entries[index]`, i.e. the first
/// following entry that is not deeper.
pub fn subtree_end(entries: &[ThreadEntry<'_>], index: usize) -> usize {
    let Some(depth) = entries.get(index).map(|e| e.depth) else {
        return entries.len();
    };

    entries[index + 1..]
        .iter()
        .position(|e| e.depth <= depth)
        .map_or(entries.len(), |offset| index + 1 + offset)
}
